use async_trait::async_trait;
use concord_core::{CapabilityError, Decider, TrxRecord};

/// An in-memory [`Decider`] with a fixed policy: the approval logic lives
/// entirely behind the trait and the core never sees which policy is in
/// effect.
pub enum Policy {
    AlwaysApprove,
    NeverApprove,
    Predicate(Box<dyn Fn(&TrxRecord) -> bool + Send + Sync>),
}

pub struct MemoryDecider {
    policy: Policy,
}

impl MemoryDecider {
    pub fn new(policy: Policy) -> Self {
        MemoryDecider { policy }
    }

    pub fn always_approve() -> Self {
        MemoryDecider::new(Policy::AlwaysApprove)
    }

    pub fn never_approve() -> Self {
        MemoryDecider::new(Policy::NeverApprove)
    }

    fn decide(&self, record: &TrxRecord) -> bool {
        match &self.policy {
            Policy::AlwaysApprove => true,
            Policy::NeverApprove => false,
            Policy::Predicate(f) => f(record),
        }
    }
}

#[async_trait]
impl Decider for MemoryDecider {
    async fn should_promise(&self, record: &TrxRecord) -> Result<bool, CapabilityError> {
        Ok(self.decide(record))
    }

    async fn should_commit(&self, record: &TrxRecord) -> Result<bool, CapabilityError> {
        Ok(self.decide(record))
    }
}
