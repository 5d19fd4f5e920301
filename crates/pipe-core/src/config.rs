//! Configuración de sesión desde variables de entorno (`.env` opcional).
//!
//! | variable               | valores                         | defecto      |
//! |------------------------|---------------------------------|--------------|
//! | `PIPE_PROJECT_ID`      | entero                          | sin proyecto |
//! | `PIPE_PERSON_ID`       | entero                          | sin persona  |
//! | `PIPE_PROCESS_TYPE`    | `template`/`job`/`done` o 1/2/3 | `template`   |
//! | `PIPE_ID_STRATEGY`     | `sequential`/`random`           | `sequential` |
//! | `PIPE_MAX_ID_ATTEMPTS` | entero > 0                      | 10000        |
use std::env;
use std::str::FromStr;

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use pipe_domain::ProcessType;

use crate::constants::DEFAULT_MAX_ID_ATTEMPTS;
use crate::constructor::CommandConstructor;
use crate::context::SessionContext;
use crate::errors::CoreEngineError;
use crate::ids::{IdAllocator, IdSource, RandomIds, SequentialIds};

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdStrategy {
    #[default]
    Sequential,
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub context: SessionContext,
    pub id_strategy: IdStrategy,
    pub max_id_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { context: SessionContext::default(),
               id_strategy: IdStrategy::default(),
               max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS }
    }
}

impl SessionConfig {
    pub fn from_env() -> Result<Self, CoreEngineError> {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreEngineError>
        where F: Fn(&str) -> Option<String>
    {
        let project_id = parse_var::<i64>("PIPE_PROJECT_ID", lookup("PIPE_PROJECT_ID"))?;
        let person_id = parse_var::<i64>("PIPE_PERSON_ID", lookup("PIPE_PERSON_ID"))?;
        let process_type = match lookup("PIPE_PROCESS_TYPE") {
            None => ProcessType::default(),
            Some(raw) => parse_process_type(&raw).ok_or_else(|| invalid("PIPE_PROCESS_TYPE", &raw))?,
        };
        let id_strategy = match lookup("PIPE_ID_STRATEGY").as_deref().map(str::trim) {
            None | Some("sequential") => IdStrategy::Sequential,
            Some("random") => IdStrategy::Random,
            Some(other) => return Err(invalid("PIPE_ID_STRATEGY", other)),
        };
        let max_id_attempts = parse_var::<u32>("PIPE_MAX_ID_ATTEMPTS", lookup("PIPE_MAX_ID_ATTEMPTS"))?.unwrap_or(DEFAULT_MAX_ID_ATTEMPTS);
        if max_id_attempts == 0 {
            return Err(invalid("PIPE_MAX_ID_ATTEMPTS", "0"));
        }
        Ok(Self { context: SessionContext { project_id, person_id, process_type },
                  id_strategy,
                  max_id_attempts })
    }

    pub fn id_allocator(&self) -> IdAllocator {
        let source: Box<dyn IdSource> = match self.id_strategy {
            IdStrategy::Sequential => Box::new(SequentialIds::default()),
            IdStrategy::Random => Box::new(RandomIds::from_entropy()),
        };
        IdAllocator::new(source, self.max_id_attempts)
    }

    /// Constructor vacío con el generador de ids configurado.
    pub fn constructor(&self) -> CommandConstructor {
        CommandConstructor::with_id_allocator(self.id_allocator())
    }
}

fn parse_var<T: FromStr>(key: &str, raw: Option<String>) -> Result<Option<T>, CoreEngineError> {
    match raw {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| invalid(key, &raw)),
    }
}

fn parse_process_type(raw: &str) -> Option<ProcessType> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "template" | "1" => Some(ProcessType::Template),
        "job" | "2" => Some(ProcessType::Job),
        "done" | "3" => Some(ProcessType::Done),
        _ => None,
    }
}

fn invalid(key: &str, value: &str) -> CoreEngineError {
    CoreEngineError::InvalidConfig { key: key.to_string(),
                                     value: value.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = SessionConfig::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(cfg, SessionConfig::default());
    }

    #[test]
    fn reads_context_and_strategy() {
        let cfg = SessionConfig::from_lookup(lookup(&[("PIPE_PROJECT_ID", "12"),
                                                      ("PIPE_PERSON_ID", " 3 "),
                                                      ("PIPE_PROCESS_TYPE", "Job"),
                                                      ("PIPE_ID_STRATEGY", "random"),
                                                      ("PIPE_MAX_ID_ATTEMPTS", "50")])).expect("config");
        assert_eq!(cfg.context, SessionContext::new(12, 3, ProcessType::Job));
        assert_eq!(cfg.id_strategy, IdStrategy::Random);
        assert_eq!(cfg.max_id_attempts, 50);
    }

    #[test]
    fn malformed_values_are_errors() {
        let err = SessionConfig::from_lookup(lookup(&[("PIPE_PROJECT_ID", "abc")])).expect_err("bad id");
        assert_eq!(err,
                   CoreEngineError::InvalidConfig { key: "PIPE_PROJECT_ID".into(),
                                                    value: "abc".into() });
        assert!(SessionConfig::from_lookup(lookup(&[("PIPE_PROCESS_TYPE", "9")])).is_err());
        assert!(SessionConfig::from_lookup(lookup(&[("PIPE_MAX_ID_ATTEMPTS", "0")])).is_err());
    }
}
