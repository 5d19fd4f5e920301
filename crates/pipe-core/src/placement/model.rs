use indexmap::IndexMap;
use pipe_domain::{EntityId, FileHash, FileToken, OutputToken};
use serde::{Deserialize, Serialize};

/// Archivo existente del proyecto, arrastrable a cualquier slot compatible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub hash: FileHash,
    #[serde(default)]
    pub name: String,
    pub filetype_id: EntityId,
}

/// Archivos del proyecto indexados por hash.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileCatalog {
    files: IndexMap<FileHash, ProjectFile>,
}

impl FileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: ProjectFile) -> bool {
        if self.files.contains_key(&file.hash) {
            return false;
        }
        self.files.insert(file.hash.clone(), file);
        true
    }

    pub fn get(&self, hash: &FileHash) -> Option<&ProjectFile> {
        self.files.get(hash)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProjectFile> {
        self.files.values()
    }

    pub fn hashes(&self) -> impl Iterator<Item = &FileHash> {
        self.files.keys()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FromIterator<ProjectFile> for FileCatalog {
    fn from_iter<I: IntoIterator<Item = ProjectFile>>(iter: I) -> Self {
        let mut catalog = FileCatalog::new();
        for f in iter {
            catalog.add(f);
        }
        catalog
    }
}

/// Item colocado en un slot de entrada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacedFile {
    /// Archivo existente del proyecto.
    Existing { hash: FileHash, filetype_id: EntityId },
    /// Salida aún no producida del slot `slot_id` del proceso `process_id`.
    Pending {
        process_id: EntityId,
        slot_id: EntityId,
        token: OutputToken,
        filetype_id: EntityId,
    },
}

impl PlacedFile {
    pub fn filetype_id(&self) -> EntityId {
        match self {
            PlacedFile::Existing { filetype_id, .. } | PlacedFile::Pending { filetype_id, .. } => *filetype_id,
        }
    }

    /// Proceso productor, si es una salida pendiente.
    pub fn producer(&self) -> Option<EntityId> {
        match self {
            PlacedFile::Existing { .. } => None,
            PlacedFile::Pending { process_id, .. } => Some(*process_id),
        }
    }

    /// Forma almacenada en el valor del PPV.
    pub fn token(&self) -> FileToken {
        match self {
            PlacedFile::Existing { hash, .. } => FileToken::Existing(hash.clone()),
            PlacedFile::Pending { token, .. } => FileToken::Pending(*token),
        }
    }
}

/// Slot de entrada: un PPV de rol "input".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSlot {
    pub ppv_id: EntityId,
    pub parameter_id: EntityId,
    /// Tipo de archivo aceptado (o cualquier descendiente).
    pub accepts: EntityId,
    pub items: Vec<PlacedFile>,
}

impl InputSlot {
    pub fn is_filled(&self) -> bool {
        self.items.len() == 1
    }
}

/// Slot de salida: un PPV de rol "output".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSlot {
    pub ppv_id: EntityId,
    pub parameter_id: EntityId,
    pub filetype_id: EntityId,
    pub token: OutputToken,
    /// Arrastrable: la fila tiene todas sus entradas cubiertas.
    pub ready: bool,
}

/// Una fila de la tabla (un proceso).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub process_id: EntityId,
    pub inputs: Vec<InputSlot>,
    pub outputs: Vec<OutputSlot>,
    pub ready: bool,
}

impl Row {
    pub fn new(process_id: EntityId) -> Self {
        Self { process_id,
               inputs: Vec::new(),
               outputs: Vec::new(),
               ready: false }
    }

    /// Sólo las filas con entradas cuentan para "todas listas".
    pub fn has_inputs(&self) -> bool {
        !self.inputs.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &PlacedFile> {
        self.inputs.iter().flat_map(|s| s.items.iter())
    }
}

/// Origen de un arrastre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum DragSource {
    /// Desde la lista de archivos del proyecto (copia).
    ExistingFile { hash: FileHash },
    /// Desde un slot de salida listo (copia).
    Output { slot_id: EntityId },
    /// Desde otro slot de entrada (mueve).
    Placed { slot_id: EntityId, index: usize },
}
