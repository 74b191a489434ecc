use tallybank_core::UserId;

/// The authenticated principal a service call is made on behalf of.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Caller {
    user_id: UserId,
}

impl Caller {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}
