use std::fmt;

/// ServerIdentity is how a server names itself on the wire. The name is picked before the
/// directory authority hands out a rank, and the rank is assigned exactly once.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    name: String,
    rank: Option<u64>,
}

impl ServerIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        ServerIdentity {
            name: name.into(),
            rank: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rank(&self) -> Option<u64> {
        self.rank
    }

    /// Returns false (and leaves the identity alone) if a rank was already assigned.
    pub(crate) fn assign_rank(&mut self, rank: u64) -> bool {
        if self.rank.is_some() {
            return false;
        }
        self.rank.replace(rank);
        true
    }
}

impl fmt::Debug for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rank {
            Some(rank) => write!(f, "{}(rank={})", self.name, rank),
            None => write!(f, "{}(unranked)", self.name),
        }
    }
}

/// One row of the directory authority's roster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RosterEntry {
    pub name: String,
    pub rank: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_is_assigned_once() {
        let mut identity = ServerIdentity::new("server_1");
        assert_eq!(identity.rank(), None);

        assert!(identity.assign_rank(4));
        assert!(!identity.assign_rank(1));
        assert_eq!(identity.rank(), Some(4));
        assert_eq!(format!("{:?}", identity), "server_1(rank=4)");
    }
}
