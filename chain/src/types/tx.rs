// chain/src/types/tx.rs

//! Transaction types for the ledger.
//!
//! This module defines the concrete transaction payloads used by the chain
//! along with a tagged [`Transaction`] enum. Transactions cover:
//!
//! - requesting a role (patient, doctor, admission),
//! - recording that a doctor vaccinated a patient, and
//! - registering a vaccine identifier.
//!
//! Each variant signs a canonical JSON rendering of its semantic fields,
//! never including its own signature fields. Whether a transaction is
//! acceptable on a given branch is decided in [`crate::validation`].

use serde::{Deserialize, Serialize};

use super::{ParseError, PublicKey, Signature};
use crate::crypto::{self, Keypair};

/// Role a [`PermissionTransaction`] asks for.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Patient,
    Admission,
    Doctor,
}

/// Self-signed request to hold a role.
///
/// The request is self-service: anyone may ask for any role and the
/// only evidence required is the sender's own signature.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PermissionTransaction {
    /// Protocol version string of the sender.
    pub version: String,
    /// Creation time, seconds since Unix epoch.
    pub timestamp: u64,
    /// Role being requested.
    pub requested_permission: Permission,
    /// Key that will hold the role.
    pub sender_pubkey: PublicKey,
    /// Sender's signature over the canonical content.
    pub signature: Option<Signature>,
}

#[derive(Serialize)]
struct PermissionContent<'a> {
    kind: &'static str,
    version: &'a str,
    timestamp: u64,
    requested_permission: Permission,
    sender_pubkey: &'a PublicKey,
}

impl PermissionTransaction {
    pub fn new(
        version: impl Into<String>,
        timestamp: u64,
        requested_permission: Permission,
        sender_pubkey: PublicKey,
    ) -> Self {
        Self {
            version: version.into(),
            timestamp,
            requested_permission,
            sender_pubkey,
            signature: None,
        }
    }

    /// Canonical bytes covered by the sender's signature.
    pub fn signing_content(&self) -> Vec<u8> {
        canonical_json(&PermissionContent {
            kind: "permission",
            version: &self.version,
            timestamp: self.timestamp,
            requested_permission: self.requested_permission,
            sender_pubkey: &self.sender_pubkey,
        })
    }

    /// Signs the request with the sender's key.
    pub fn sign(mut self, sender: &Keypair) -> Self {
        self.signature = Some(sender.sign(&self.signing_content()));
        self
    }

    /// Returns `true` if the sender's signature is present and valid.
    pub fn verify_signature(&self) -> bool {
        self.signature.as_ref().is_some_and(|sig| {
            crypto::verify(&self.sender_pubkey, &self.signing_content(), sig)
        })
    }
}

/// Dual-signed record that a doctor vaccinated a patient.
///
/// The doctor signs first. The patient's signature also covers the
/// doctor's signature, so it can only be produced after it.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct VaccinationTransaction {
    pub version: String,
    pub timestamp: u64,
    /// Registered vaccine identifier.
    pub vaccine: String,
    pub doctor_pubkey: PublicKey,
    pub patient_pubkey: PublicKey,
    pub doctor_signature: Option<Signature>,
    pub patient_signature: Option<Signature>,
}

#[derive(Serialize)]
struct VaccinationContent<'a> {
    kind: &'static str,
    version: &'a str,
    timestamp: u64,
    vaccine: &'a str,
    doctor_pubkey: &'a PublicKey,
    patient_pubkey: &'a PublicKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    doctor_signature: Option<&'a Signature>,
}

impl VaccinationTransaction {
    pub fn new(
        version: impl Into<String>,
        timestamp: u64,
        vaccine: impl Into<String>,
        doctor_pubkey: PublicKey,
        patient_pubkey: PublicKey,
    ) -> Self {
        Self {
            version: version.into(),
            timestamp,
            vaccine: vaccine.into(),
            doctor_pubkey,
            patient_pubkey,
            doctor_signature: None,
            patient_signature: None,
        }
    }

    fn content(&self, as_doctor: bool) -> Vec<u8> {
        canonical_json(&VaccinationContent {
            kind: "vaccination",
            version: &self.version,
            timestamp: self.timestamp,
            vaccine: &self.vaccine,
            doctor_pubkey: &self.doctor_pubkey,
            patient_pubkey: &self.patient_pubkey,
            doctor_signature: if as_doctor {
                None
            } else {
                self.doctor_signature.as_ref()
            },
        })
    }

    /// Canonical bytes covered by the doctor's signature.
    pub fn doctor_content(&self) -> Vec<u8> {
        self.content(true)
    }

    /// Canonical bytes covered by the patient's signature.
    ///
    /// Includes the doctor's signature.
    pub fn patient_content(&self) -> Vec<u8> {
        self.content(false)
    }

    /// Adds the doctor's signature. An existing signature is kept.
    pub fn sign_as_doctor(&mut self, doctor: &Keypair) {
        if self.doctor_signature.is_some() {
            tracing::debug!("doctor signature exists; not re-signing");
            return;
        }
        self.doctor_signature = Some(doctor.sign(&self.doctor_content()));
    }

    /// Adds the patient's signature. An existing signature is kept.
    pub fn sign_as_patient(&mut self, patient: &Keypair) {
        if self.patient_signature.is_some() {
            tracing::debug!("patient signature exists; not re-signing");
            return;
        }
        self.patient_signature = Some(patient.sign(&self.patient_content()));
    }

    /// Signs as doctor, then as patient.
    pub fn sign(mut self, doctor: &Keypair, patient: &Keypair) -> Self {
        self.sign_as_doctor(doctor);
        self.sign_as_patient(patient);
        self
    }
}

/// Registers a vaccine identifier.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct VaccineTransaction {
    pub version: String,
    pub timestamp: u64,
    /// Identifier being registered.
    pub vaccine: String,
    /// Admission node registering the vaccine.
    pub registrant_pubkey: PublicKey,
    pub signature: Option<Signature>,
}

#[derive(Serialize)]
struct VaccineContent<'a> {
    kind: &'static str,
    version: &'a str,
    timestamp: u64,
    vaccine: &'a str,
    registrant_pubkey: &'a PublicKey,
}

impl VaccineTransaction {
    pub fn new(
        version: impl Into<String>,
        timestamp: u64,
        vaccine: impl Into<String>,
        registrant_pubkey: PublicKey,
    ) -> Self {
        Self {
            version: version.into(),
            timestamp,
            vaccine: vaccine.into(),
            registrant_pubkey,
            signature: None,
        }
    }

    pub fn signing_content(&self) -> Vec<u8> {
        canonical_json(&VaccineContent {
            kind: "vaccine",
            version: &self.version,
            timestamp: self.timestamp,
            vaccine: &self.vaccine,
            registrant_pubkey: &self.registrant_pubkey,
        })
    }

    pub fn sign(mut self, registrant: &Keypair) -> Self {
        self.signature = Some(registrant.sign(&self.signing_content()));
        self
    }

    pub fn verify_signature(&self) -> bool {
        self.signature.as_ref().is_some_and(|sig| {
            crypto::verify(&self.registrant_pubkey, &self.signing_content(), sig)
        })
    }
}

/// Top-level transaction enum.
///
/// This is the type that appears in blocks and in the transaction pool.
/// On the wire every transaction is one JSON object, internally tagged
/// by a `"type"` discriminator. Equality is full field-value equality,
/// which is what pool deduplication relies on.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Transaction {
    /// Requests a role.
    Permission(PermissionTransaction),
    /// Records a vaccination.
    Vaccination(VaccinationTransaction),
    /// Registers a vaccine.
    Vaccine(VaccineTransaction),
}

impl Transaction {
    /// Returns the canonical one-line representation of this transaction.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails. This is considered a programming error,
    /// because every field is a string, integer or enum.
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).expect("Transaction should always be serializable to JSON")
    }

    /// Decodes a transaction from its canonical line.
    pub fn from_line(line: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(line)?)
    }

    /// Short variant name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Transaction::Permission(_) => "permission",
            Transaction::Vaccination(_) => "vaccination",
            Transaction::Vaccine(_) => "vaccine",
        }
    }
}

impl From<PermissionTransaction> for Transaction {
    fn from(tx: PermissionTransaction) -> Self {
        Transaction::Permission(tx)
    }
}

impl From<VaccinationTransaction> for Transaction {
    fn from(tx: VaccinationTransaction) -> Self {
        Transaction::Vaccination(tx)
    }
}

impl From<VaccineTransaction> for Transaction {
    fn from(tx: VaccineTransaction) -> Self {
        Transaction::Vaccine(tx)
    }
}

fn canonical_json<T: Serialize>(content: &T) -> Vec<u8> {
    serde_json::to_vec(content).expect("signing content should always be serializable to JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair(seed: u8) -> Keypair {
        Keypair::from_seed(&[seed; 32])
    }

    #[test]
    fn permission_signature_verifies_and_detects_tampering() {
        let sender = keypair(1);
        let tx = PermissionTransaction::new(
            "0.0.1",
            1_700_000_000,
            Permission::Doctor,
            sender.public_key().clone(),
        )
        .sign(&sender);
        assert!(tx.verify_signature());

        let mut tampered = tx.clone();
        tampered.requested_permission = Permission::Admission;
        assert!(!tampered.verify_signature());
    }

    #[test]
    fn unsigned_transaction_does_not_verify() {
        let sender = keypair(2);
        let tx = VaccineTransaction::new("0.0.1", 1, "measles", sender.public_key().clone());
        assert!(!tx.verify_signature());
    }

    #[test]
    fn patient_content_depends_on_doctor_signature() {
        let doctor = keypair(3);
        let patient = keypair(4);
        let mut tx = VaccinationTransaction::new(
            "0.0.1",
            5,
            "polio",
            doctor.public_key().clone(),
            patient.public_key().clone(),
        );
        let before = tx.patient_content();
        tx.sign_as_doctor(&doctor);

        assert_ne!(before, tx.patient_content());
        assert_eq!(tx.doctor_content(), before);
    }

    #[test]
    fn transaction_line_carries_type_tag() {
        let sender = keypair(5);
        let tx: Transaction =
            VaccineTransaction::new("0.0.1", 9, "a vaccine", sender.public_key().clone())
                .sign(&sender)
                .into();

        let line = tx.to_line();
        assert!(line.contains("\"type\":\"vaccine\""), "line: {line}");
        assert!(!line.contains('\n'));

        let decoded = Transaction::from_line(&line).expect("decode tx line");
        assert_eq!(decoded, tx);
    }

    #[test]
    fn unknown_type_tag_is_a_parse_error() {
        let err = Transaction::from_line(r#"{"type":"transfer","amount":1}"#).unwrap_err();
        assert!(matches!(err, ParseError::Record(_)));
    }
}
