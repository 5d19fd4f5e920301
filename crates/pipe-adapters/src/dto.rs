//! Formas de respuesta de las llamadas al backend.
use pipe_core::{CommandConstructor, Commandlines};
use pipe_domain::{Command, Dependency, Filetype, Parameter, ParameterType, Process, ProcessParameterValue, Software};
use serde::{Deserialize, Serialize};

/// Respuesta de `getCommand`: un comando y su esquema de parámetros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandBundle {
    pub command: Command,
    #[serde(default)]
    pub filetypes: Vec<Filetype>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub parametertypes: Vec<ParameterType>,
    #[serde(default)]
    pub software: Option<Software>,
}

impl CommandBundle {
    pub fn into_constructor(self) -> CommandConstructor {
        let mut cc = CommandConstructor::new();
        cc.add_command(self.command);
        for f in self.filetypes {
            cc.add_filetype(f);
        }
        for p in self.parameters {
            cc.add_parameter(p);
        }
        for t in self.parametertypes {
            cc.add_parameter_type(t);
        }
        if let Some(software) = self.software {
            cc.add_software(software);
        }
        cc
    }
}

/// Respuesta de `getProcessWithDependencies`: un proceso guardado y el
/// cierre de entidades que necesita.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessBundle {
    pub process: Process,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub processes: Vec<Process>,
    #[serde(default)]
    pub commands: Vec<Command>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub parametertypes: Vec<ParameterType>,
    #[serde(default)]
    pub processparametervalues: Vec<ProcessParameterValue>,
    #[serde(default)]
    pub softwares: Vec<Software>,
    #[serde(default)]
    pub filetypes: Vec<Filetype>,
}

impl ProcessBundle {
    pub fn into_constructor(self) -> CommandConstructor {
        let mut cc = CommandConstructor::new();
        cc.add_process(self.process);
        for p in self.processes {
            cc.add_process(p);
        }
        for d in self.dependencies {
            cc.add_dependency(d);
        }
        for c in self.commands {
            cc.add_command(c);
        }
        for p in self.parameters {
            cc.add_parameter(p);
        }
        for t in self.parametertypes {
            cc.add_parameter_type(t);
        }
        for v in self.processparametervalues {
            cc.add_process_parameter_value(v);
        }
        for s in self.softwares {
            cc.add_software(s);
        }
        for f in self.filetypes {
            cc.add_filetype(f);
        }
        cc
    }
}

/// Respuesta de `getHelp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpResponse {
    pub help: String,
}

/// Respuesta de `getBashCommandPreview` y `createProcess`.
pub type CommandLinesResponse = Commandlines;
