//! Permission-scoped transaction validity.
//!
//! Every transaction is checked against the [`Registrations`] of the state
//! it would be applied to: the leaf it is pooled for, or the parent of the
//! block that carries it. Failures carry a human-readable reason, which
//! is also logged at `debug`.

use std::collections::HashSet;

use crate::consensus::error::ValidationError;
use crate::consensus::validator::{BlockContext, BlockValidator};
use crate::ledger::Registrations;
use crate::types::{
    Block, PermissionTransaction, Transaction, VaccinationTransaction, VaccineTransaction,
};

fn reject(reason: &'static str) -> ValidationError {
    tracing::debug!(reason, "transaction failed validation");
    ValidationError::Invalid(reason)
}

impl PermissionTransaction {
    /// Checks the sender's own signature.
    ///
    /// Role requests are self-service: whether the sender may hold the
    /// requested role is not checked.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.verify_signature() {
            return Err(reject("sender signature is not valid"));
        }
        Ok(())
    }
}

impl VaccinationTransaction {
    /// Checks registrations first, then both signatures.
    pub fn validate(&self, registrations: &Registrations) -> Result<(), ValidationError> {
        if !registrations.has_vaccine(&self.vaccine) {
            return Err(reject("vaccine is not registered"));
        }
        if !registrations.is_doctor(&self.doctor_pubkey) {
            return Err(reject("doctor is not registered"));
        }
        let (Some(doctor_sig), Some(patient_sig)) = (&self.doctor_signature, &self.patient_signature)
        else {
            return Err(reject("vaccination is missing a signature"));
        };
        if !crate::crypto::verify(&self.doctor_pubkey, &self.doctor_content(), doctor_sig) {
            return Err(reject("doctor signature is not valid"));
        }
        if !crate::crypto::verify(&self.patient_pubkey, &self.patient_content(), patient_sig) {
            return Err(reject("patient signature is not valid"));
        }
        Ok(())
    }
}

impl VaccineTransaction {
    /// Checks the registrant's signature and admission, and that the
    /// vaccine is new.
    pub fn validate(&self, registrations: &Registrations) -> Result<(), ValidationError> {
        if !self.verify_signature() {
            return Err(reject("registrant signature is not valid"));
        }
        if !registrations.is_admission(&self.registrant_pubkey) {
            return Err(reject("registrant is not an admission node"));
        }
        if registrations.has_vaccine(&self.vaccine) {
            return Err(reject("vaccine is already registered"));
        }
        Ok(())
    }
}

impl Transaction {
    /// Validates the transaction against `registrations`.
    pub fn validate(&self, registrations: &Registrations) -> Result<(), ValidationError> {
        match self {
            Transaction::Permission(tx) => tx.validate(),
            Transaction::Vaccination(tx) => tx.validate(registrations),
            Transaction::Vaccine(tx) => tx.validate(registrations),
        }
    }
}

/// Block validity predicate that validates every carried transaction
/// against the parent state.
///
/// A vaccine name may be registered at most once per block, even by
/// otherwise distinct transactions.
#[derive(Clone, Copy, Debug, Default)]
pub struct PermissionValidity;

impl BlockValidator for PermissionValidity {
    fn validate(&self, block: &Block, ctx: &BlockContext<'_>) -> Result<(), ValidationError> {
        let mut registered = HashSet::new();
        for (pos, tx) in block.transactions.iter().enumerate() {
            tx.validate(ctx.registrations).map_err(|e| {
                ValidationError::Custom(format!("transaction {pos} ({}): {}", tx.kind(), e.reason()))
            })?;
            if let Transaction::Vaccine(v) = tx {
                if !registered.insert(v.vaccine.as_str()) {
                    return Err(ValidationError::Custom(format!(
                        "transaction {pos} (vaccine): {} is registered twice in block",
                        v.vaccine
                    )));
                }
            }
        }
        Ok(())
    }
}
