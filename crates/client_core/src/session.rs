use shared::domain::{CustomRepayment, LoanParameters, LoanRequest};

/// What the client remembers between actions: the last accepted base
/// submission and the custom repayment currently on screen.
#[derive(Debug, Default)]
pub struct SessionMemory {
    base: Option<LoanParameters>,
    displayed_custom: Option<CustomRepayment>,
}

impl SessionMemory {
    pub fn base(&self) -> Option<&LoanParameters> {
        self.base.as_ref()
    }

    pub fn remember_original(&mut self, params: LoanParameters) {
        self.base = Some(params);
        self.displayed_custom = None;
    }

    pub fn remember_custom(&mut self, custom: CustomRepayment) {
        self.displayed_custom = Some(custom);
    }

    pub fn forget_custom(&mut self) {
        self.displayed_custom = None;
    }

    /// The request that reproduces what is on screen.
    pub fn displayed_request(&self) -> Option<LoanRequest> {
        let params = self.base.clone()?;
        Some(LoanRequest {
            params,
            custom_repayment: self.displayed_custom,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// Orders responses by when their request was issued. A response only
/// applies if nothing issued after it has applied already.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: u64,
    applied: u64,
}

impl RequestSequencer {
    pub fn issue(&mut self) -> RequestToken {
        self.issued += 1;
        RequestToken(self.issued)
    }

    /// Every token issued so far becomes stale.
    pub fn invalidate(&mut self) {
        self.applied = self.issued;
    }

    pub fn try_apply(&mut self, token: RequestToken) -> bool {
        if token.0 <= self.applied {
            return false;
        }
        self.applied = token.0;
        true
    }
}
