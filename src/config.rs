//! Run configuration: the header translation table, date columns, sheet name
//! and the external hook command.
//!
//! The built-in defaults describe the loading export and the `Seguimento`
//! ledger. A JSON file may override any field; omitted fields keep their
//! defaults.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

const DEFAULT_COLUMN_MAPPING: [(&str, &str); 25] = [
    ("Load Number", "LOAD"),
    ("RO description", "Check flujo"),
    ("Número de carga externo", "AUTEX N°"),
    ("Service Level", "Tipo de Servicio"),
    ("Peso de la carga [kg]", "PESO"),
    ("Volumen de la carga [m³]", "M3"),
    ("Medición de la carga [LM]", "SATURACION"),
    ("Consignor Customer-ID", "COFOR"),
    ("Consignor Company", "PROVEEDOR"),
    ("Consignor City", "CIUDAD"),
    ("Transport Mode", "FLUJO"),
    ("Means of transport", "TIPO DE VEHICULO COLECTA"),
    ("Plate Truck", "PLACA COLECTA"),
    ("Código: Puerto de origen", "CRT"),
    ("N° de pedido", "NF"),
    ("Salida del lugar de recogida", "SAÍDA REAL PROVEDOR"),
    ("Invoice", "FACTURA"),
    ("TO Comment", "OBSERVACIONES"),
    ("Latest release date", "LIBERACION EN FRONTERA"),
    ("Pickup date", "FECHA DE COLECTA iTMS"),
    ("Delivery date", "FECHA DESCARGA"),
    ("Llegada al lugar de entrega", "ARRIBO STELLANTIS"),
    ("ETA", "PREVISION ARRIBO STELLANTIS"),
    ("ETA al lugar de entrega", "VENTANA ARRIBO STELLANTIS"),
    ("Service provider Company", "TRANSPORTE"),
];

const DEFAULT_DATE_COLUMNS: [&str; 6] = [
    "FECHA DE COLECTA iTMS",
    "FECHA DESCARGA",
    "LIBERACION EN FRONTERA",
    "PREVISION ARRIBO STELLANTIS",
    "VENTANA ARRIBO STELLANTIS",
    "ARRIBO STELLANTIS",
];

/// One source header and the ledger header it becomes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnRename {
    pub source: String,
    pub target: String,
}

/// External post-processing command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Program to run after the ledger is saved.
    pub command: Option<String>,
    /// Arguments passed before the macro name and the saved file path.
    pub args: Vec<String>,
    /// Macro or procedure name handed to the command.
    pub macro_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppendConfig {
    /// Ordered source-name → ledger-name translation table. Case-sensitive.
    pub column_mapping: Vec<ColumnRename>,
    /// Ledger columns whose values are parsed and formatted as dates.
    pub date_columns: BTreeSet<String>,
    /// Sheet of the ledger workbook that receives the rows.
    pub sheet_name: String,
    /// Case-insensitive file name fragment identifying the loading export.
    pub loading_pattern: String,
    /// Case-insensitive file name fragment identifying the ledger.
    pub target_pattern: String,
    pub hook: HookConfig,
}

impl Default for AppendConfig {
    fn default() -> Self {
        Self {
            column_mapping: DEFAULT_COLUMN_MAPPING
                .iter()
                .map(|(source, target)| ColumnRename {
                    source: source.to_string(),
                    target: target.to_string(),
                })
                .collect(),
            date_columns: DEFAULT_DATE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            sheet_name: "Seguimento".to_string(),
            loading_pattern: "loading".to_string(),
            target_pattern: "seguimento".to_string(),
            hook: HookConfig::default(),
        }
    }
}

impl AppendConfig {
    /// Load overrides from a JSON file on top of the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
    }

    /// Ledger name for a source header, if the header is mapped.
    pub fn translate(&self, source: &str) -> Option<&str> {
        self.column_mapping
            .iter()
            .find(|r| r.source == source)
            .map(|r| r.target.as_str())
    }

    pub fn is_date_column(&self, name: &str) -> bool {
        self.date_columns.contains(name)
    }
}
