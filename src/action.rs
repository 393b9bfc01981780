use std::fmt;

use uuid::Uuid;

use crate::catalog::Section;

/// Identifies one dispatched fetch. `seq` grows per selector so responses
/// arriving out of order can be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId {
    pub seq: u64,
    pub uuid: Uuid,
}

impl RequestId {
    pub fn new(seq: u64) -> Self { Self { seq, uuid: Uuid::new_v4() } }

    /// True when `self` was issued after `other` by the same selector.
    pub fn is_newer_than(&self, other: &RequestId) -> bool { self.seq > other.seq }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}/{}", self.seq, self.uuid)
    }
}

/// Deferred fetch handed to a [`Dispatch`](crate::store::Dispatch) implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchAction {
    pub id: RequestId,
    /// Store slice the results belong to.
    pub kind: Section,
    pub category: String,
    pub page: u32,
    /// Entry url template with the page already appended.
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_order_by_sequence() {
        let a = RequestId::new(1);
        let b = RequestId::new(2);
        assert!(b.is_newer_than(&a));
        assert!(!a.is_newer_than(&b));
        assert_ne!(a.uuid, b.uuid);
    }

    #[test]
    fn display_includes_sequence() {
        let id = RequestId::new(7);
        assert!(id.to_string().starts_with("#7/"));
    }
}
