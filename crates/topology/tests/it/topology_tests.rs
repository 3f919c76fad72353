//! Round lifecycle through the public surface: build, query, forget.

use rotor_config::TopologyConfig;
use rotor_test_utils::{init_test_tracing, ConnectionRecorder, GovernanceFixture, TopologyFixture};
use rotor_topology::{ConnectionServer, Governance, PeerTopology};
use rotor_types::{CommitteeLabel, PeerId};
use std::collections::{BTreeMap, BTreeSet};

/// Nine nodes with three programmed rounds.
///
/// The local node (index zero) is a member of round 10's chain 0 and DKG
/// committee, round 11's chain 0, and both round 12 committees. Round 11's
/// chain 1 is large enough that the default bound forces a partial draw.
fn scenario_fixture() -> TopologyFixture {
    let fixture = TopologyFixture::builder().build();
    fixture.insert_round(10, &[&[0, 1, 2], &[1, 3], &[2, 4]], &[0, 1, 3]);
    fixture.insert_round(11, &[&[0, 1, 5], &[3, 4, 5, 6, 7]], &[2, 6]);
    fixture.insert_round(12, &[&[0, 7, 8]], &[0, 3, 5]);
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

/// Rebuild the expected reverse index from the other public queries.
pub(crate) fn recomputed_justifications<G, C>(
    topology: &PeerTopology<G, C>,
) -> BTreeMap<PeerId, BTreeSet<CommitteeLabel>>
where
    G: Governance,
    C: ConnectionServer,
{
    let local = topology.local_identity();
    let mut expected: BTreeMap<PeerId, BTreeSet<CommitteeLabel>> = BTreeMap::new();
    for label in topology.known_labels() {
        let members = topology.committee_members(&label).expect("known label has membership");
        let connected: BTreeSet<PeerId> = if topology.is_direct(&label) {
            members.into_iter().filter(|peer| *peer != local).collect()
        } else {
            topology.group_peers(&label).unwrap_or_default()
        };
        for peer in connected {
            expected.entry(peer).or_default().insert(label);
        }
    }
    expected
}

fn assert_reverse_index_consistent(
    topology: &PeerTopology<GovernanceFixture, ConnectionRecorder>,
    fixture: &TopologyFixture,
) {
    let expected = recomputed_justifications(topology);
    assert_eq!(topology.justified_peer_count(), expected.len());
    for index in 0..fixture.number_of_nodes() {
        let peer = fixture.peer(index);
        let labels = expected.get(&peer).cloned().unwrap_or_default();
        assert_eq!(topology.justifications_for(&peer), labels, "node {index}");
        assert_eq!(topology.is_justified(&peer), !labels.is_empty(), "node {index}");
    }
}

#[test]
fn rounds_accumulate_and_classify_by_membership() {
    init_test_tracing();
    let fixture = scenario_fixture();
    let (topology, recorder) = new_topology(&fixture);

    topology.build_connection(10).expect("round 10 resolves");
    topology.build_connection(11).expect("round 11 resolves");
    topology.build_connection(12).expect("round 12 resolves");

    let expected_labels: BTreeSet<CommitteeLabel> = [
        CommitteeLabel::notary(10, 0),
        CommitteeLabel::notary(10, 1),
        CommitteeLabel::notary(10, 2),
        CommitteeLabel::dkg(10),
        CommitteeLabel::notary(11, 0),
        CommitteeLabel::notary(11, 1),
        CommitteeLabel::dkg(11),
        CommitteeLabel::notary(12, 0),
        CommitteeLabel::dkg(12),
    ]
    .into();
    assert_eq!(topology.known_labels(), expected_labels);

    // membership of the local node decides the policy for every label
    let local = topology.local_identity();
    for label in topology.known_labels() {
        let members = topology.committee_members(&label).expect("known label");
        assert_eq!(topology.is_direct(&label), members.contains(&local), "{label}");
        match topology.group_peers(&label) {
            Some(subset) => {
                assert!(!topology.is_direct(&label), "{label}");
                assert!(!subset.is_empty(), "{label}");
                assert!(subset.is_subset(&members), "{label}");
                assert!(!subset.contains(&local), "{label}");
            }
            None => assert!(topology.is_direct(&label) || members.is_empty(), "{label}"),
        }
    }

    // small committees are sampled in full under the default bound
    assert_eq!(topology.group_peers(&CommitteeLabel::notary(10, 1)), Some(fixture.peers([1, 3])));
    assert_eq!(topology.group_peers(&CommitteeLabel::notary(10, 2)), Some(fixture.peers([2, 4])));
    assert_eq!(topology.group_peers(&CommitteeLabel::dkg(11)), Some(fixture.peers([2, 6])));
    // the five-member committee is cut down to the bound
    let sampled = topology.group_peers(&CommitteeLabel::notary(11, 1)).expect("group label");
    assert_eq!(sampled.len(), 3);

    // node 1 sits in four committees across both rounds
    assert_eq!(
        topology.justifications_for(&fixture.peer(1)),
        [
            CommitteeLabel::notary(10, 0),
            CommitteeLabel::notary(10, 1),
            CommitteeLabel::dkg(10),
            CommitteeLabel::notary(11, 0),
        ]
        .into(),
    );
    // the local node never justifies a connection to itself
    assert!(!topology.is_justified(&local));
    assert!(topology.justifications_for(&local).is_empty());

    // the transport was asked for exactly the justified peers
    let justified: BTreeSet<PeerId> = recomputed_justifications(&topology).into_keys().collect();
    assert_eq!(recorder.connected(), justified);
    assert_reverse_index_consistent(&topology, &fixture);
}

#[test]
fn forget_middle_round_keeps_other_justifications() {
    let fixture = scenario_fixture();
    let (topology, recorder) = new_topology(&fixture);
    for round in [10, 11, 12] {
        topology.build_connection(round).expect("round resolves");
    }

    topology.forget_connection(11);

    // round 11 labels are gone, the neighbors are intact
    let labels = topology.known_labels();
    assert!(labels.iter().all(|label| !label.is_for_round(11)));
    assert_eq!(labels.iter().filter(|label| label.is_for_round(10)).count(), 4);
    assert_eq!(labels.iter().filter(|label| label.is_for_round(12)).count(), 2);

    // node 5 was connected for round 11 but survives through round 12's dkg
    assert_eq!(topology.justifications_for(&fixture.peer(5)), [CommitteeLabel::dkg(12)].into());
    assert!(recorder.connected().contains(&fixture.peer(5)));

    // node 6 had round 11 justifications only and is released
    assert!(!topology.is_justified(&fixture.peer(6)));
    assert!(recorder.released().contains(&fixture.peer(6)));
    assert!(!recorder.connected().contains(&fixture.peer(6)));

    // node 2 merely loses the round 11 dkg label
    assert_eq!(
        topology.justifications_for(&fixture.peer(2)),
        [CommitteeLabel::notary(10, 0), CommitteeLabel::notary(10, 2)].into(),
    );

    assert_reverse_index_consistent(&topology, &fixture);
}

#[test]
fn forgetting_every_round_releases_every_peer() {
    let fixture = scenario_fixture();
    let (topology, recorder) = new_topology(&fixture);
    for round in [10, 11, 12] {
        topology.build_connection(round).expect("round resolves");
    }

    topology.forget_connection(11);
    topology.forget_connection(10);
    topology.forget_connection(12);

    assert_eq!(topology.committee_count(), 0);
    assert_eq!(topology.justified_peer_count(), 0);
    assert!(topology.known_labels().is_empty());
    assert!(recorder.connected().is_empty(), "{:?}", recorder.connected());
    for index in 0..fixture.number_of_nodes() {
        assert!(!topology.is_justified(&fixture.peer(index)));
    }
}

#[test]
fn forget_is_idempotent_and_tolerates_unknown_rounds() {
    let fixture = scenario_fixture();
    let (topology, recorder) = new_topology(&fixture);

    // forgetting before anything was built is a no-op
    topology.forget_connection(10);
    assert!(recorder.is_empty());
    assert_eq!(topology.committee_count(), 0);

    topology.build_connection(10).expect("round 10 resolves");
    let labels = topology.known_labels();
    let commands = recorder.len();

    // a round that never existed leaves the state alone
    topology.forget_connection(99);
    assert_eq!(topology.known_labels(), labels);
    assert_eq!(recorder.len(), commands);

    // the second forget finds nothing left to do
    topology.forget_connection(10);
    let after_first = recorder.len();
    topology.forget_connection(10);
    assert_eq!(recorder.len(), after_first);
    assert_eq!(topology.committee_count(), 0);
}

#[test]
fn build_order_is_commutative() {
    // a bound above every committee size makes group draws exhaustive, so
    // both managers converge to identical state regardless of build order
    let config = TopologyConfig { group_conn_peers: 16 };
    let fixture = scenario_fixture();

    let forward_recorder = ConnectionRecorder::default();
    let forward = PeerTopology::new(
        fixture.governance(),
        forward_recorder.clone(),
        &fixture.node_table(),
        config,
    );
    let reverse_recorder = ConnectionRecorder::default();
    let reverse = PeerTopology::new(
        fixture.governance(),
        reverse_recorder.clone(),
        &fixture.node_table(),
        config,
    );

    for round in [10, 11, 12] {
        forward.build_connection(round).expect("round resolves");
    }
    for round in [12, 10, 11] {
        reverse.build_connection(round).expect("round resolves");
    }

    assert_eq!(forward.known_labels(), reverse.known_labels());
    for label in forward.known_labels() {
        assert_eq!(forward.committee_members(&label), reverse.committee_members(&label), "{label}");
        assert_eq!(forward.is_direct(&label), reverse.is_direct(&label), "{label}");
        assert_eq!(forward.group_peers(&label), reverse.group_peers(&label), "{label}");
    }
    for index in 0..fixture.number_of_nodes() {
        let peer = fixture.peer(index);
        assert_eq!(forward.justifications_for(&peer), reverse.justifications_for(&peer));
    }
    assert_eq!(forward_recorder.connected(), reverse_recorder.connected());
}
