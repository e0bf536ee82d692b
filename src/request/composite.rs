//! Generic two-phase composite state machine: `create_account` followed by one
//! operation-specific follow-up instruction, each gated on a signature reaching the configured
//! commitment. `init_mapping`, `add_mapping`, `add_product`, `add_price`, `add_publisher` all
//! instantiate this with a different [`CompositeOp`] rather than each hand-rolling their own copy
//! of the state chart.

use solana_program::instruction::Instruction;
use solana_sdk::signature::Signature;

use crate::error::CoreError;

use super::base::Lifecycle;

/// The operation-specific half of a two-phase composite request: how to build the two
/// instructions. Everything about *when* they get submitted and what happens on success/failure
/// is owned by [`TwoPhase`] itself.
pub trait CompositeOp {
    /// The instruction that creates or touches the freshly-funded account.
    fn build_create(&self) -> Instruction;
    /// The follow-up instruction submitted once the create transaction's signature is finalized.
    /// Only called when [`CompositeOp::has_followup`] is `true`.
    fn build_followup(&self) -> Instruction {
        unreachable!("has_followup() is false; build_followup() should never be called")
    }
    /// Some ops (`add_publisher`) have nothing left to create an account for and need only the
    /// one instruction plus its signature confirmation.
    fn has_followup(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    CreateSent,
    CreateSig,
    InitSent,
    InitSig,
}

pub struct TwoPhase<Op: CompositeOp> {
    op: Op,
    phase: Phase,
    lifecycle: Lifecycle,
    create_signature: Option<Signature>,
    followup_signature: Option<Signature>,
}

impl<Op: CompositeOp> TwoPhase<Op> {
    pub fn new(op: Op) -> Self {
        Self {
            op,
            phase: Phase::CreateSent,
            lifecycle: Lifecycle::Pending,
            create_signature: None,
            followup_signature: None,
        }
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn mark_ready(&mut self) {
        if self.lifecycle == Lifecycle::Pending {
            self.lifecycle = Lifecycle::Ready;
        }
    }

    /// The instruction to submit right now, given the current phase. `None` once the machine has
    /// moved past submitting (it is waiting on a signature notification instead).
    pub fn next_instruction(&self) -> Option<Instruction> {
        match self.phase {
            Phase::CreateSent if self.lifecycle == Lifecycle::Ready => {
                Some(self.op.build_create())
            }
            Phase::InitSent => Some(self.op.build_followup()),
            _ => None,
        }
    }

    pub fn on_submitted(&mut self) {
        self.lifecycle = Lifecycle::Submitted;
    }

    /// The create (or follow-up) transaction's direct response arrived.
    pub fn on_response(&mut self, result: Result<Signature, CoreError>) {
        match result {
            Err(err) => self.lifecycle = Lifecycle::Error(err),
            Ok(signature) => match self.phase {
                Phase::CreateSent => {
                    self.create_signature = Some(signature);
                    self.phase = Phase::CreateSig;
                    self.lifecycle = Lifecycle::Subscribed;
                }
                Phase::InitSent => {
                    self.followup_signature = Some(signature);
                    self.phase = Phase::InitSig;
                    self.lifecycle = Lifecycle::Subscribed;
                }
                Phase::CreateSig | Phase::InitSig => {
                    self.lifecycle =
                        Lifecycle::Error(CoreError::protocol("response while awaiting signature"));
                }
            },
        }
    }

    /// The subscribed-for signature notification arrived at the configured commitment.
    pub fn on_signature_confirmed(&mut self, result: Result<(), CoreError>) {
        if let Err(err) = result {
            self.lifecycle = Lifecycle::Error(err);
            return;
        }
        match self.phase {
            Phase::CreateSig if !self.op.has_followup() => {
                self.lifecycle = Lifecycle::Done;
            }
            Phase::CreateSig => {
                self.phase = Phase::InitSent;
                self.lifecycle = Lifecycle::Ready;
            }
            Phase::InitSig => {
                self.lifecycle = Lifecycle::Done;
            }
            Phase::CreateSent | Phase::InitSent => {
                self.lifecycle = Lifecycle::Error(CoreError::protocol(
                    "signature notification before a signature was requested",
                ));
            }
        }
    }

    pub fn create_signature(&self) -> Option<Signature> {
        self.create_signature
    }

    pub fn followup_signature(&self) -> Option<Signature> {
        self.followup_signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_program::{instruction::AccountMeta, pubkey::Pubkey};

    struct FakeOp {
        program_id: Pubkey,
        account: Pubkey,
    }

    impl CompositeOp for FakeOp {
        fn build_create(&self) -> Instruction {
            Instruction {
                program_id: self.program_id,
                accounts: vec![AccountMeta::new(self.account, true)],
                data: vec![0],
            }
        }

        fn build_followup(&self) -> Instruction {
            Instruction {
                program_id: self.program_id,
                accounts: vec![AccountMeta::new(self.account, false)],
                data: vec![1],
            }
        }
    }

    fn fake() -> TwoPhase<FakeOp> {
        TwoPhase::new(FakeOp {
            program_id: Pubkey::new_unique(),
            account: Pubkey::new_unique(),
        })
    }

    #[test]
    fn walks_the_documented_state_chart_to_done() {
        let mut request = fake();
        request.mark_ready();
        assert!(request.next_instruction().is_some());

        request.on_submitted();
        request.on_response(Ok(Signature::new_unique()));
        assert_eq!(*request.lifecycle(), Lifecycle::Subscribed);

        request.on_signature_confirmed(Ok(()));
        assert_eq!(*request.lifecycle(), Lifecycle::Ready);
        assert!(request.next_instruction().is_some());

        request.on_submitted();
        request.on_response(Ok(Signature::new_unique()));
        request.on_signature_confirmed(Ok(()));

        assert_eq!(*request.lifecycle(), Lifecycle::Done);
    }

    #[test]
    fn an_on_chain_reject_is_terminal() {
        let mut request = fake();
        request.mark_ready();
        request.on_submitted();
        request.on_response(Err(CoreError::on_chain_reject("insufficient funds")));

        assert!(request.lifecycle().is_terminal());
    }

    #[test]
    fn state_never_moves_backward_on_an_unexpected_response() {
        let mut request = fake();
        request.mark_ready();
        request.on_submitted();
        request.on_response(Ok(Signature::new_unique()));
        // A second direct response while we're waiting on a signature notification is a protocol
        // violation, not silently ignored.
        request.on_response(Ok(Signature::new_unique()));

        assert!(request.lifecycle().is_terminal());
    }

    struct NoFollowupOp {
        program_id: Pubkey,
        account: Pubkey,
    }

    impl CompositeOp for NoFollowupOp {
        fn build_create(&self) -> Instruction {
            Instruction {
                program_id: self.program_id,
                accounts: vec![AccountMeta::new(self.account, true)],
                data: vec![0],
            }
        }

        fn has_followup(&self) -> bool {
            false
        }
    }

    #[test]
    fn an_op_without_a_followup_completes_after_one_signature() {
        let mut request = TwoPhase::new(NoFollowupOp {
            program_id: Pubkey::new_unique(),
            account: Pubkey::new_unique(),
        });
        request.mark_ready();
        request.on_submitted();
        request.on_response(Ok(Signature::new_unique()));
        request.on_signature_confirmed(Ok(()));

        assert_eq!(*request.lifecycle(), Lifecycle::Done);
    }
}
