//! Builders, forgetters, and readers hitting one manager from many threads.

use crate::topology_tests::recomputed_justifications;
use rotor_config::TopologyConfig;
use rotor_test_utils::{ConnectionRecorder, GovernanceFixture, TopologyFixture};
use rotor_topology::PeerTopology;
use rotor_types::{CommitteeLabel, PeerId};
use std::{collections::BTreeSet, thread};

/// Every committee fits inside the default group bound, so repeated builds
/// draw the same subsets and the settled state is deterministic.
fn stress_fixture() -> TopologyFixture {
    let fixture = TopologyFixture::builder().build();
    fixture.insert_round(0, &[&[0, 1, 2]], &[3, 4]);
    fixture.insert_round(1, &[&[0, 1], &[2, 3]], &[4, 5]);
    fixture.insert_round(2, &[&[1, 5, 6]], &[0, 6]);
    fixture.insert_round(3, &[&[2, 7], &[0, 8]], &[1, 7]);
    fixture.insert_round(4, &[&[3, 8]], &[0, 2, 5]);
    fixture
}

fn new_topology(
    fixture: &TopologyFixture,
) -> (PeerTopology<GovernanceFixture, ConnectionRecorder>, ConnectionRecorder) {
    let recorder = ConnectionRecorder::default();
    let topology = PeerTopology::new(
        fixture.governance(),
        recorder.clone(),
        &fixture.node_table(),
        TopologyConfig::default(),
    );
    (topology, recorder)
}

#[test]
fn concurrent_builds_and_forgets_settle_consistently() {
    let fixture = stress_fixture();
    let (topology, recorder) = new_topology(&fixture);
    topology.build_connection(0).expect("round 0 resolves");

    let local = topology.local_identity();
    let peers: Vec<PeerId> = (0..fixture.number_of_nodes()).map(|i| fixture.peer(i)).collect();

    thread::scope(|scope| {
        for _ in 0..4 {
            let builder = topology.clone();
            scope.spawn(move || {
                for _ in 0..8 {
                    for round in 1..=4 {
                        builder.build_connection(round).expect("round resolves");
                    }
                }
            });
        }
        let forgetter = topology.clone();
        scope.spawn(move || forgetter.forget_connection(0));
        for _ in 0..2 {
            let reader = topology.clone();
            let local = local.clone();
            let peers = peers.clone();
            scope.spawn(move || {
                for _ in 0..32 {
                    for peer in &peers {
                        let _ = reader.justifications_for(peer);
                    }
                    for label in reader.known_labels() {
                        let _ = reader.committee_members(&label);
                    }
                    // no connection ever points back at the local node
                    assert!(!reader.is_justified(&local));
                    assert!(reader.justifications_for(&local).is_empty());
                }
            });
        }
    });

    // round 0 was forgotten and nothing rebuilt it
    let labels = topology.known_labels();
    assert!(labels.iter().all(|label| !label.is_for_round(0)));
    assert_eq!(labels.len(), 10);

    // every surviving label is direct or group, never both
    for label in &labels {
        let members = topology.committee_members(label).expect("known label");
        assert!(!members.is_empty());
        assert_ne!(topology.is_direct(label), topology.group_peers(label).is_some(), "{label}");
    }

    let expected = recomputed_justifications(&topology);
    assert_eq!(topology.justified_peer_count(), expected.len());
    assert_eq!(expected.len(), 8);
    for (peer, justifications) in &expected {
        assert_eq!(&topology.justifications_for(peer), justifications);
    }
    assert_eq!(
        topology.justifications_for(&fixture.peer(5)),
        [CommitteeLabel::dkg(1), CommitteeLabel::notary(2, 0), CommitteeLabel::dkg(4)].into(),
    );
    assert_eq!(
        topology.justifications_for(&fixture.peer(8)),
        [CommitteeLabel::notary(3, 1), CommitteeLabel::notary(4, 0)].into(),
    );

    // interleaved release orders are the transport's problem, but every
    // justified peer must have seen at least one request
    let justified: BTreeSet<PeerId> = expected.into_keys().collect();
    assert!(justified.is_subset(&recorder.requested()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn builds_from_spawned_tasks_accumulate() {
    let fixture = stress_fixture();
    let (topology, recorder) = new_topology(&fixture);

    let mut handles = Vec::new();
    for round in 1..=4 {
        let builder = topology.clone();
        handles.push(tokio::spawn(async move {
            builder.build_connection(round).expect("round resolves");
        }));
    }
    for handle in handles {
        handle.await.expect("build task completes");
    }

    assert_eq!(topology.committee_count(), 10);
    let expected = recomputed_justifications(&topology);
    assert_eq!(topology.justified_peer_count(), expected.len());
    for (peer, justifications) in &expected {
        assert_eq!(&topology.justifications_for(peer), justifications);
    }

    // without forgets the request log settles to exactly the justified set
    let justified: BTreeSet<PeerId> = expected.into_keys().collect();
    assert_eq!(recorder.connected(), justified);
    assert!(recorder.released().is_empty());
}
