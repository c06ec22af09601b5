use crate::model::RosterEntry;
use crate::server::state_change_listener::{self, CoordinationChangeNotifier};
use crate::server::{CoordinationChangeListener, CoordinationSnapshot};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Unranked,
    Registered,
    Coordinator,
    Follower,
    Electing,
}

/// What to do after an election probe settles.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ProbeVerdict {
    /// Reply belongs to a round that is no longer running.
    Stale,
    /// Other probes of this round are still out.
    Pending,
    /// A lower ranked peer answered, so this server backs off.
    Abstain,
    SelfElect,
}

/// CoordinationState tracks who this server believes the coordinator is, and which phase of the
/// coordination state machine it is in. It decides "what" and never talks to the network.
pub(crate) struct CoordinationState {
    my_name: String,
    phase: Phase,
    coordinator: Option<String>,
    roster: Vec<RosterEntry>,
    election: ElectionRound,
    notifier: CoordinationChangeNotifier,
}

#[derive(Debug, Default)]
struct ElectionRound {
    round: u64,
    outstanding: usize,
    running: bool,
}

impl CoordinationState {
    pub(crate) fn new(my_name: String) -> (Self, CoordinationChangeListener) {
        let (notifier, listener) = state_change_listener::new(CoordinationSnapshot::Unranked);

        let state = CoordinationState {
            my_name,
            phase: Phase::Unranked,
            coordinator: None,
            roster: Vec::new(),
            election: ElectionRound::default(),
            notifier,
        };

        (state, listener)
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn coordinator(&self) -> Option<&str> {
        self.coordinator.as_deref()
    }

    pub(crate) fn is_coordinator(&self) -> bool {
        self.coordinator.as_deref() == Some(self.my_name.as_str())
    }

    pub(crate) fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    pub(crate) fn update_roster(&mut self, roster: Vec<RosterEntry>) {
        self.roster = roster;
    }

    /// The roster entry of the believed coordinator, if it is still on the roster.
    pub(crate) fn coordinator_entry(&self) -> Option<&RosterEntry> {
        let coordinator = self.coordinator.as_deref()?;
        self.roster.iter().find(|entry| entry.name == coordinator)
    }

    pub(crate) fn rank_one_peer(&self) -> Option<&str> {
        self.roster
            .iter()
            .find(|entry| entry.rank == 1 && entry.name != self.my_name)
            .map(|entry| entry.name.as_str())
    }

    pub(crate) fn mark_registered(&mut self) {
        self.phase = Phase::Registered;
    }

    pub(crate) fn become_coordinator(&mut self) {
        self.election.running = false;
        self.phase = Phase::Coordinator;
        self.coordinator = Some(self.my_name.clone());
        self.notify_new_state();
    }

    /// Become a follower. `None` keeps whatever coordinator is currently believed.
    pub(crate) fn become_follower(&mut self, coordinator: Option<String>) {
        self.election.running = false;
        self.phase = Phase::Follower;
        if coordinator.is_some() {
            self.coordinator = coordinator;
        }
        self.notify_new_state();
    }

    /// Adopt an announced coordinator unconditionally. Returns the previously believed one.
    pub(crate) fn adopt_announcement(&mut self, coordinator: String) -> Option<String> {
        let previous = self.coordinator.replace(coordinator);
        if self.is_coordinator() {
            self.phase = Phase::Coordinator;
        } else {
            // Any running election is settled by the announcement.
            self.election.running = false;
            self.phase = Phase::Follower;
        }
        self.notify_new_state();

        previous
    }

    pub(crate) fn is_electing(&self) -> bool {
        self.phase == Phase::Electing && self.election.running
    }

    /// Start a new election round and return its number. Replies tagged with older rounds are
    /// ignored from now on.
    pub(crate) fn start_election(&mut self) -> u64 {
        self.election.round += 1;
        self.election.outstanding = 0;
        self.election.running = true;
        self.phase = Phase::Electing;
        self.notify_new_state();

        self.election.round
    }

    pub(crate) fn is_current_round(&self, round: u64) -> bool {
        self.election.running && self.election.round == round
    }

    /// Peers that outrank this server (strictly lower rank number).
    pub(crate) fn lower_ranked_peers(&self, my_rank: u64) -> Vec<RosterEntry> {
        self.roster
            .iter()
            .filter(|entry| entry.rank < my_rank && entry.name != self.my_name)
            .cloned()
            .collect()
    }

    pub(crate) fn probes_sent(&mut self, round: u64, count: usize) {
        if self.is_current_round(round) {
            self.election.outstanding = count;
        }
    }

    pub(crate) fn record_probe(&mut self, round: u64, answered_ok: bool) -> ProbeVerdict {
        if !self.is_current_round(round) {
            return ProbeVerdict::Stale;
        }

        if answered_ok {
            self.election.running = false;
            return ProbeVerdict::Abstain;
        }

        self.election.outstanding = self.election.outstanding.saturating_sub(1);
        if self.election.outstanding == 0 {
            self.election.running = false;
            ProbeVerdict::SelfElect
        } else {
            ProbeVerdict::Pending
        }
    }

    /// Only a few servers answer a sync request, so peers are not flooded with snapshots.
    pub(crate) fn should_answer_sync_request(&self, my_rank: u64) -> bool {
        if self.is_coordinator() || my_rank == 1 {
            return true;
        }

        self.coordinator.is_none() && my_rank <= 2
    }

    pub(crate) fn snapshot(&self) -> CoordinationSnapshot {
        match (self.phase, &self.coordinator) {
            (Phase::Unranked, _) | (Phase::Registered, _) => CoordinationSnapshot::Unranked,
            (Phase::Coordinator, _) => CoordinationSnapshot::Coordinator,
            (Phase::Electing, _) => CoordinationSnapshot::Electing,
            (Phase::Follower, Some(coordinator)) => CoordinationSnapshot::Follower(coordinator.clone()),
            (Phase::Follower, None) => CoordinationSnapshot::FollowerNoCoordinator,
        }
    }

    fn notify_new_state(&self) {
        self.notifier.notify_new_state(self.snapshot());
    }
}

impl fmt::Debug for CoordinationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinationState")
            .field("phase", &self.phase)
            .field("coordinator", &self.coordinator)
            .field("roster", &self.roster)
            .field("election", &self.election)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(entries: &[(&str, u64)]) -> Vec<RosterEntry> {
        entries
            .iter()
            .map(|(name, rank)| RosterEntry {
                name: name.to_string(),
                rank: *rank,
            })
            .collect()
    }

    #[test]
    fn any_ok_abstains_and_keeps_coordinator() {
        let (mut state, _listener) = CoordinationState::new("c".into());
        state.become_follower(Some("a".into()));

        let round = state.start_election();
        state.probes_sent(round, 2);

        assert_eq!(state.record_probe(round, false), ProbeVerdict::Pending);
        assert_eq!(state.record_probe(round, true), ProbeVerdict::Abstain);
        assert_eq!(state.coordinator(), Some("a"));
    }

    #[test]
    fn all_failed_probes_self_elect() {
        let (mut state, _listener) = CoordinationState::new("c".into());
        let round = state.start_election();
        state.probes_sent(round, 2);

        assert_eq!(state.record_probe(round, false), ProbeVerdict::Pending);
        assert_eq!(state.record_probe(round, false), ProbeVerdict::SelfElect);
        // Late replies from the finished round are ignored.
        assert_eq!(state.record_probe(round, true), ProbeVerdict::Stale);
    }

    #[test]
    fn replies_from_an_older_round_are_stale() {
        let (mut state, _listener) = CoordinationState::new("c".into());
        let first = state.start_election();
        state.probes_sent(first, 1);
        let second = state.start_election();
        state.probes_sent(second, 1);

        assert_eq!(state.record_probe(first, true), ProbeVerdict::Stale);
        assert_eq!(state.record_probe(second, false), ProbeVerdict::SelfElect);
    }

    #[test]
    fn announcement_moves_candidate_to_follower() {
        let (mut state, listener) = CoordinationState::new("b".into());
        let round = state.start_election();

        let previous = state.adopt_announcement("a".into());
        assert_eq!(previous, None);
        assert_eq!(state.phase(), Phase::Follower);
        assert_eq!(state.record_probe(round, false), ProbeVerdict::Stale);
        assert_eq!(listener.current(), CoordinationSnapshot::Follower("a".into()));
    }

    #[test]
    fn announcement_unseats_coordinator() {
        let (mut state, _listener) = CoordinationState::new("a".into());
        state.become_coordinator();

        assert_eq!(state.adopt_announcement("b".into()), Some("a".into()));
        assert!(!state.is_coordinator());
        assert_eq!(state.phase(), Phase::Follower);
    }

    #[test]
    fn lower_ranked_peers_exclude_self_and_higher_ranks() {
        let (mut state, _listener) = CoordinationState::new("b".into());
        state.update_roster(roster(&[("a", 1), ("b", 2), ("c", 3)]));

        let peers = state.lower_ranked_peers(2);
        assert_eq!(peers, roster(&[("a", 1)]));
        assert_eq!(state.rank_one_peer(), Some("a"));
    }

    #[test]
    fn sync_responders() {
        let (mut state, _listener) = CoordinationState::new("b".into());
        assert!(state.should_answer_sync_request(2));
        assert!(!state.should_answer_sync_request(3));

        state.become_follower(Some("a".into()));
        assert!(!state.should_answer_sync_request(2));
        assert!(state.should_answer_sync_request(1));
    }

    #[test]
    fn coordinator_entry_requires_roster_presence() {
        let (mut state, _listener) = CoordinationState::new("b".into());
        state.become_follower(Some("a".into()));
        state.update_roster(roster(&[("b", 2)]));
        assert!(state.coordinator_entry().is_none());

        state.update_roster(roster(&[("a", 1), ("b", 2)]));
        assert_eq!(state.coordinator_entry().map(|e| e.rank), Some(1));
    }
}
