//! Binary encoding of theory, claims and proofs.
//!
//! The artifact is three byte streams read by an external stack-machine
//! checker:
//!
//! - `theory`: every asserted axiom, each followed by `PUBLISH`.
//! - `claims`: the claims in reverse declaration order, each followed by
//!   `PUBLISH`. The checker pushes them on a stack, so proof `i` discharges
//!   claim `i`.
//! - `proofs`: the proofs in declaration order, each followed by `PUBLISH`.
//!
//! Terms are written in postfix order. Notations never reach the wire: each
//! notation instance is unfolded one level at a time and its encoding is
//! saved to the checker memory, so every later occurrence is a single
//! `LOAD`. Composite sub-patterns and sub-proofs that occur more than once in
//! a stream are saved on first write as well. Sub-proofs whose conclusion is
//! a registered lemma are saved once per conclusion and reused by any later
//! derivation of the same conclusion.
//!
//! Serialization is a pure function of its inputs. Claims and proofs are
//! paired before anything is written; a mismatch is fatal.

use crate::error::{PackagingError, Result};
use crate::fingerprint::HashValue;
use crate::pattern::notation::NotationRegistry;
use crate::pattern::Pattern;
use crate::proof::{Proof, ProofRule};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::info;

const DOMAIN_ARTIFACT_V0: &[u8] = b"PROOF_ARTIFACT_V0";

/// Wire opcodes.
///
/// All operands are little-endian `u32`. A symbol operand is a `u32` byte
/// length followed by the UTF-8 name.
pub mod opcode {
    /// `EVAR id`
    pub const EVAR: u8 = 2;
    /// `SVAR id`
    pub const SVAR: u8 = 3;
    /// `SYMBOL len bytes`
    pub const SYMBOL: u8 = 4;
    /// `left right IMPLICATION`
    pub const IMPLICATION: u8 = 5;
    /// `left right APPLICATION`
    pub const APPLICATION: u8 = 6;
    /// `body MU var`
    pub const MU: u8 = 7;
    /// `body EXISTS var`
    pub const EXISTS: u8 = 8;
    /// `METAVAR id`
    pub const METAVAR: u8 = 9;
    pub const PROP1: u8 = 12;
    pub const PROP2: u8 = 13;
    pub const PROP3: u8 = 14;
    /// `left right MODUS_PONENS`, `right` proving `left → conclusion`
    pub const MODUS_PONENS: u8 = 15;
    /// `inner plug… INSTANTIATE n id…`, plugs in ascending id order
    pub const INSTANTIATE: u8 = 16;
    /// `AXIOM index` into the published theory
    pub const AXIOM: u8 = 17;
    /// Copies the stack top into the next memory slot.
    pub const SAVE: u8 = 19;
    /// `LOAD slot`
    pub const LOAD: u8 = 20;
    /// Pops the stack top into the stream's output list.
    pub const PUBLISH: u8 = 22;
}

/// The encoded streams.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProofArtifact {
    pub theory: Vec<u8>,
    pub claims: Vec<u8>,
    pub proofs: Vec<u8>,
}

impl ProofArtifact {
    /// Domain-separated hash over the three streams.
    pub fn digest(&self) -> HashValue {
        let mut bytes =
            Vec::with_capacity(24 + self.theory.len() + self.claims.len() + self.proofs.len());
        for stream in [&self.theory, &self.claims, &self.proofs] {
            bytes.extend_from_slice(&(stream.len() as u64).to_le_bytes());
            bytes.extend_from_slice(stream);
        }
        HashValue::hash_with_domain(DOMAIN_ARTIFACT_V0, &bytes)
    }

    /// Total encoded size in bytes.
    pub fn len(&self) -> usize {
        self.theory.len() + self.claims.len() + self.proofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_cbor(&self) -> std::result::Result<Vec<u8>, Box<dyn std::error::Error>> {
        let bytes = serde_cbor::to_vec(self)?;
        Ok(bytes)
    }

    pub fn from_cbor(bytes: &[u8]) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let artifact = serde_cbor::from_slice(bytes)?;
        Ok(artifact)
    }

    /// Writes the artifact as a single CBOR file.
    pub fn save_to_file(&self, path: &std::path::Path) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let bytes = self.to_cbor()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load_from_file(path: &std::path::Path) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)?;
        Self::from_cbor(&bytes)
    }
}

/// Encodes `axioms`, `claims` and `proofs`.
///
/// Proof `i` must conclude claim `i`, and every assumed axiom a proof uses
/// must be one of `axioms`.
pub fn serialize(
    axioms: &[Pattern],
    claims: &[Pattern],
    proofs: &[Proof],
    notations: &NotationRegistry,
    lemmas: &BTreeSet<Pattern>,
) -> Result<ProofArtifact> {
    check_pairing(claims, proofs)?;

    let theory_index: HashMap<&Pattern, u32> = axioms
        .iter()
        .enumerate()
        .map(|(i, axiom)| (axiom, i as u32))
        .rev()
        .collect();

    let mut theory = StreamWriter::new(notations, lemmas, &theory_index);
    for axiom in axioms {
        theory.count_pattern(axiom)?;
    }
    for axiom in axioms {
        theory.write_pattern(axiom)?;
        theory.op(opcode::PUBLISH);
    }

    let mut claim_stream = StreamWriter::new(notations, lemmas, &theory_index);
    for claim in claims {
        claim_stream.count_pattern(claim)?;
    }
    for claim in claims.iter().rev() {
        claim_stream.write_pattern(claim)?;
        claim_stream.op(opcode::PUBLISH);
    }

    let mut proof_stream = StreamWriter::new(notations, lemmas, &theory_index);
    for proof in proofs {
        proof_stream.count_proof(proof)?;
    }
    for proof in proofs {
        proof_stream.write_proof(proof)?;
        proof_stream.op(opcode::PUBLISH);
    }

    let artifact = ProofArtifact {
        theory: theory.out,
        claims: claim_stream.out,
        proofs: proof_stream.out,
    };
    info!(
        axioms = axioms.len(),
        claims = claims.len(),
        bytes = artifact.len(),
        digest = %artifact.digest(),
        "serialized proof artifact"
    );
    Ok(artifact)
}

fn check_pairing(claims: &[Pattern], proofs: &[Proof]) -> Result<()> {
    let mut pending: Vec<&Pattern> = claims.iter().rev().collect();
    for (index, proof) in proofs.iter().enumerate() {
        let claim = pending
            .pop()
            .ok_or(PackagingError::UnclaimedProof { index })?;
        if proof.conclusion() != claim {
            return Err(PackagingError::ConclusionMismatch {
                index,
                expected: claim.to_string(),
                found: proof.conclusion().to_string(),
            }
            .into());
        }
    }
    if !pending.is_empty() {
        return Err(PackagingError::MissingProofs {
            claims: claims.len(),
            proofs: proofs.len(),
        }
        .into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Stream writer
// ---------------------------------------------------------------------------

/// One output stream with its own checker memory.
struct StreamWriter<'a> {
    notations: &'a NotationRegistry,
    lemmas: &'a BTreeSet<Pattern>,
    theory: &'a HashMap<&'a Pattern, u32>,
    out: Vec<u8>,
    pattern_uses: HashMap<Pattern, usize>,
    proof_uses: HashMap<Proof, usize>,
    saved_patterns: HashMap<Pattern, u32>,
    saved_proofs: HashMap<Proof, u32>,
    saved_lemmas: HashMap<Pattern, u32>,
    next_slot: u32,
}

impl<'a> StreamWriter<'a> {
    fn new(
        notations: &'a NotationRegistry,
        lemmas: &'a BTreeSet<Pattern>,
        theory: &'a HashMap<&'a Pattern, u32>,
    ) -> Self {
        Self {
            notations,
            lemmas,
            theory,
            out: Vec::new(),
            pattern_uses: HashMap::new(),
            proof_uses: HashMap::new(),
            saved_patterns: HashMap::new(),
            saved_proofs: HashMap::new(),
            saved_lemmas: HashMap::new(),
            next_slot: 0,
        }
    }

    fn op(&mut self, code: u8) {
        self.out.push(code);
    }

    fn operand(&mut self, value: u32) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }

    fn save(&mut self) -> u32 {
        self.op(opcode::SAVE);
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    fn load(&mut self, slot: u32) {
        self.op(opcode::LOAD);
        self.operand(slot);
    }

    /// Counts composite occurrences, visiting each distinct sub-term once.
    ///
    /// Walks exactly the structure `write_pattern` emits, notations included.
    fn count_pattern(&mut self, pattern: &Pattern) -> Result<()> {
        if pattern.is_leaf() {
            return Ok(());
        }
        let uses = self.pattern_uses.entry(pattern.clone()).or_insert(0);
        *uses += 1;
        if *uses > 1 {
            return Ok(());
        }
        match pattern {
            Pattern::Notation { name, args } => {
                let expanded = self.notations.expand(name, args)?;
                self.count_pattern(&expanded)
            }
            _ => {
                for child in pattern.children() {
                    self.count_pattern(child)?;
                }
                Ok(())
            }
        }
    }

    fn count_proof(&mut self, proof: &Proof) -> Result<()> {
        if proof.premises().is_empty() {
            return Ok(());
        }
        let uses = self.proof_uses.entry(proof.clone()).or_insert(0);
        *uses += 1;
        if *uses > 1 {
            return Ok(());
        }
        if let ProofRule::Instantiate(_, substitution) = proof.rule() {
            for plug in substitution.values() {
                self.count_pattern(plug)?;
            }
        }
        for premise in proof.premises() {
            self.count_proof(premise)?;
        }
        Ok(())
    }

    fn write_pattern(&mut self, pattern: &Pattern) -> Result<()> {
        if let Some(&slot) = self.saved_patterns.get(pattern) {
            self.load(slot);
            return Ok(());
        }
        match pattern {
            Pattern::Symbol(name) => {
                self.op(opcode::SYMBOL);
                self.operand(name.len() as u32);
                self.out.extend_from_slice(name.as_bytes());
                return Ok(());
            }
            Pattern::EVar(id) => {
                self.op(opcode::EVAR);
                self.operand(*id);
                return Ok(());
            }
            Pattern::SVar(id) => {
                self.op(opcode::SVAR);
                self.operand(*id);
                return Ok(());
            }
            Pattern::MetaVar(id) => {
                self.op(opcode::METAVAR);
                self.operand(*id);
                return Ok(());
            }
            Pattern::Application(l, r) => {
                self.write_pattern(l)?;
                self.write_pattern(r)?;
                self.op(opcode::APPLICATION);
            }
            Pattern::Implication(l, r) => {
                self.write_pattern(l)?;
                self.write_pattern(r)?;
                self.op(opcode::IMPLICATION);
            }
            Pattern::Exists(var, body) => {
                self.write_pattern(body)?;
                self.op(opcode::EXISTS);
                self.operand(*var);
            }
            Pattern::Mu(var, body) => {
                self.write_pattern(body)?;
                self.op(opcode::MU);
                self.operand(*var);
            }
            Pattern::Notation { name, args } => {
                let expanded = self.notations.expand(name, args)?;
                self.write_pattern(&expanded)?;
            }
        }

        let always = matches!(pattern, Pattern::Notation { .. });
        if always || self.pattern_uses.get(pattern).is_some_and(|&n| n > 1) {
            let slot = self.save();
            self.saved_patterns.insert(pattern.clone(), slot);
        }
        Ok(())
    }

    fn write_proof(&mut self, proof: &Proof) -> Result<()> {
        if let Some(&slot) = self.saved_proofs.get(proof) {
            self.load(slot);
            return Ok(());
        }
        let lemma = self.lemmas.contains(proof.conclusion());
        if lemma {
            if let Some(&slot) = self.saved_lemmas.get(proof.conclusion()) {
                self.load(slot);
                return Ok(());
            }
        }

        match proof.rule() {
            ProofRule::Prop1 => {
                self.op(opcode::PROP1);
                return Ok(());
            }
            ProofRule::Prop2 => {
                self.op(opcode::PROP2);
                return Ok(());
            }
            ProofRule::Prop3 => {
                self.op(opcode::PROP3);
                return Ok(());
            }
            ProofRule::Axiom(pattern) => {
                let index = self.theory.get(pattern).copied().ok_or_else(|| {
                    PackagingError::UnknownAxiom {
                        axiom: pattern.to_string(),
                    }
                })?;
                self.op(opcode::AXIOM);
                self.operand(index);
                return Ok(());
            }
            ProofRule::ModusPonens(left, right) => {
                self.write_proof(left)?;
                self.write_proof(right)?;
                self.op(opcode::MODUS_PONENS);
            }
            ProofRule::Instantiate(inner, substitution) => {
                self.write_proof(inner)?;
                for plug in substitution.values() {
                    self.write_pattern(plug)?;
                }
                self.op(opcode::INSTANTIATE);
                self.operand(substitution.len() as u32);
                for id in substitution.keys() {
                    self.operand(*id);
                }
            }
        }

        if lemma {
            let slot = self.save();
            self.saved_lemmas.insert(proof.conclusion().clone(), slot);
        } else if self.proof_uses.get(proof).is_some_and(|&n| n > 1) {
            let slot = self.save();
            self.saved_proofs.insert(proof.clone(), slot);
        }
        Ok(())
    }
}
