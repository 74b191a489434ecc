use tallybank_core::UserId;
use tallybank_ledger::Caller;

/// Authenticated caller for a request, derived from the bearer token subject.
///
/// Inserted by the auth middleware; must be present for all account routes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CallerContext {
    user_id: UserId,
}

impl CallerContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn caller(&self) -> Caller {
        Caller::new(self.user_id)
    }
}
