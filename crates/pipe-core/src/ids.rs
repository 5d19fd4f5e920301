//! Generación de ids temporales y tokens de salida.
//!
//! Una `IdSource` propone candidatos; el `IdAllocator` los confirma contra
//! un oráculo de unicidad (la tabla correspondiente del constructor) y corta
//! tras `max_attempts` candidatos ocupados.
use std::fmt::Debug;

use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constants::{DEFAULT_MAX_ID_ATTEMPTS, MAX_TEMPORARY_ID};
use crate::errors::CoreEngineError;

/// Fuente de candidatos en `0..=MAX_TEMPORARY_ID`.
pub trait IdSource: Debug + Send {
    fn next_candidate(&mut self) -> u32;
    fn box_clone(&self) -> Box<dyn IdSource>;
}

impl Clone for Box<dyn IdSource> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Contador monótono con vuelta al cero (por defecto).
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    next: u32,
}

impl SequentialIds {
    pub fn starting_at(next: u32) -> Self {
        Self { next }
    }
}

impl IdSource for SequentialIds {
    fn next_candidate(&mut self) -> u32 {
        let n = self.next;
        self.next = if n >= MAX_TEMPORARY_ID { 0 } else { n + 1 };
        n
    }

    fn box_clone(&self) -> Box<dyn IdSource> {
        Box::new(self.clone())
    }
}

/// Enteros aleatorios uniformes, como los ids de página del editor web.
#[derive(Debug, Clone)]
pub struct RandomIds {
    rng: StdRng,
}

impl RandomIds {
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Semilla fija: secuencia reproducible (tests).
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl IdSource for RandomIds {
    fn next_candidate(&mut self) -> u32 {
        self.rng.gen_range(0..=MAX_TEMPORARY_ID)
    }

    fn box_clone(&self) -> Box<dyn IdSource> {
        Box::new(self.clone())
    }
}

#[derive(Debug, Clone)]
pub struct IdAllocator {
    source: Box<dyn IdSource>,
    max_attempts: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(Box::new(SequentialIds::default()), DEFAULT_MAX_ID_ATTEMPTS)
    }
}

impl IdAllocator {
    pub fn new(source: Box<dyn IdSource>, max_attempts: u32) -> Self {
        Self { source, max_attempts: max_attempts.max(1) }
    }

    /// Devuelve el primer candidato que `taken` no reclama.
    pub fn allocate<F>(&mut self, mut taken: F) -> Result<u32, CoreEngineError>
        where F: FnMut(u32) -> bool
    {
        for _ in 0..self.max_attempts {
            let candidate = self.source.next_candidate();
            if !taken(candidate) {
                return Ok(candidate);
            }
        }
        warn!("id space exhausted after {} attempts", self.max_attempts);
        Err(CoreEngineError::IdSpaceExhausted { attempts: self.max_attempts })
    }
}
