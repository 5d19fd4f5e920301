//! Constantes del core.

/// Versión del formato de plan (entra en el fingerprint).
pub const PLAN_FORMAT_VERSION: &str = "1";

/// Cota superior (inclusive) de los enteros usados para ids temporales y
/// tokens de salida.
pub const MAX_TEMPORARY_ID: u32 = 32_767;

/// Intentos por defecto antes de declarar agotado el espacio de ids.
pub const DEFAULT_MAX_ID_ATTEMPTS: u32 = 10_000;
