use crate::types::message::Message;
use crate::types::user::UserId;

/// Outbound delivery state of a message the viewer sent, derived on every query
/// from the receipt sets. Never cached: the sets are the only truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Sent,
    Delivered,
    Read,
}

impl ReceiptStatus {
    /// Resolves the receipt indicator for `viewer`, or `None` when the message
    /// was sent by the other party (their messages carry no outbound indicator
    /// for the viewer).
    ///
    /// `Read` wins over `Delivered`; the viewer's own presence in either set
    /// counts for nothing.
    pub fn resolve(message: &Message, viewer: &UserId) -> Option<ReceiptStatus> {
        if &message.sender != viewer {
            return None;
        }
        let someone_else = |set: &std::collections::HashSet<UserId>| {
            set.iter().any(|participant| participant != viewer)
        };
        if someone_else(&message.read_by) {
            Some(ReceiptStatus::Read)
        } else if someone_else(&message.delivered_to) {
            Some(ReceiptStatus::Delivered)
        } else {
            Some(ReceiptStatus::Sent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::message_at;

    fn viewer() -> UserId {
        UserId::new("me")
    }

    #[test]
    fn fresh_own_message_is_sent() {
        let msg = message_at("m1", "c1", "me", 10);
        assert_eq!(
            ReceiptStatus::resolve(&msg, &viewer()),
            Some(ReceiptStatus::Sent)
        );
    }

    #[test]
    fn read_takes_precedence_over_delivered() {
        let mut msg = message_at("m1", "c1", "me", 10);
        msg.delivered_to.insert(UserId::new("them"));
        msg.read_by.insert(UserId::new("them"));
        assert_eq!(
            ReceiptStatus::resolve(&msg, &viewer()),
            Some(ReceiptStatus::Read)
        );
    }

    #[test]
    fn delivered_without_read() {
        let mut msg = message_at("m1", "c1", "me", 10);
        msg.delivered_to.insert(UserId::new("them"));
        assert_eq!(
            ReceiptStatus::resolve(&msg, &viewer()),
            Some(ReceiptStatus::Delivered)
        );
    }

    #[test]
    fn viewer_in_the_sets_does_not_count() {
        let mut msg = message_at("m1", "c1", "me", 10);
        msg.delivered_to.insert(viewer());
        msg.read_by.insert(viewer());
        assert_eq!(
            ReceiptStatus::resolve(&msg, &viewer()),
            Some(ReceiptStatus::Sent)
        );
    }

    #[test]
    fn other_partys_message_has_no_indicator() {
        let mut msg = message_at("m1", "c1", "them", 10);
        msg.read_by.insert(viewer());
        assert_eq!(ReceiptStatus::resolve(&msg, &viewer()), None);
    }
}
