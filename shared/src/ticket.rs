/// Generation stamp carried by an asynchronous request.
///
/// A result is only applied if its ticket still matches the slot that issued
/// it; unmounting a panel bumps the generation so late replies are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

/// At most one in-flight request, plus the generation that issued it.
#[derive(Debug, Default)]
pub struct RequestSlot {
    generation: u64,
    pending: bool,
}

impl RequestSlot {
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Issues a ticket, or `None` while a request is already outstanding.
    pub fn begin(&mut self) -> Option<Ticket> {
        if self.pending {
            return None;
        }
        self.generation += 1;
        self.pending = true;
        Some(Ticket(self.generation))
    }

    /// Settles the outstanding request. Returns `false` for a stale ticket,
    /// whose result must be discarded.
    pub fn finish(&mut self, ticket: Ticket) -> bool {
        if !self.pending || ticket.0 != self.generation {
            return false;
        }
        self.pending = false;
        true
    }

    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.pending = false;
    }

    /// Abandons any outstanding request and issues a fresh ticket.
    pub fn restart(&mut self) -> Ticket {
        self.generation += 1;
        self.pending = true;
        Ticket(self.generation)
    }
}

/// An image handed to the gateway, with the ticket its reply must present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub ticket: Ticket,
    pub data_uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_request_at_a_time() {
        let mut slot = RequestSlot::default();
        let ticket = slot.begin().unwrap();
        assert!(slot.is_pending());
        assert_eq!(slot.begin(), None);
        assert!(slot.finish(ticket));
        assert!(!slot.is_pending());
        assert!(!slot.finish(ticket));
        assert!(slot.begin().is_some());
    }

    #[test]
    fn invalidated_tickets_are_stale() {
        let mut slot = RequestSlot::default();
        let old = slot.begin().unwrap();
        slot.invalidate();
        assert!(!slot.is_pending());
        let fresh = slot.begin().unwrap();
        assert_ne!(old, fresh);
        assert!(!slot.finish(old));
        assert!(slot.is_pending());
        assert!(slot.finish(fresh));
    }

    #[test]
    fn restart_supersedes_the_pending_ticket() {
        let mut slot = RequestSlot::default();
        let first = slot.begin().unwrap();
        let second = slot.restart();
        assert!(slot.is_pending());
        assert!(!slot.finish(first));
        assert!(slot.finish(second));
    }
}
