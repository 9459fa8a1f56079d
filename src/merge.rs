//! One append run: locate inputs, back up the ledger, append, save, then
//! hand the saved file to the post-processing hook.

use crate::appender::{AppendOutcome, LedgerAppender};
use crate::config::AppendConfig;
use crate::discover::{self, InputFiles};
use crate::error::{Error, Result};
use crate::hook::{HookOutcome, PostProcessHook};
use crate::progress::{Checkpoint, ProgressSink};
use crate::reader;
use crate::table;
use crate::writer::{self, PreviewConfig};
use std::io::Write;
use std::path::PathBuf;

pub struct MergeRequest {
    /// Folder searched for inputs not given explicitly.
    pub folder: PathBuf,
    pub loading: Option<PathBuf>,
    pub target: Option<PathBuf>,
    pub backup: bool,
    /// Render the appended rows instead of saving.
    pub preview: Option<PreviewConfig>,
}

impl MergeRequest {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            loading: None,
            target: None,
            backup: true,
            preview: None,
        }
    }

    fn resolve_inputs(&self, config: &AppendConfig) -> Result<InputFiles> {
        match (&self.loading, &self.target) {
            (Some(loading), Some(target)) => Ok(InputFiles {
                loading: loading.clone(),
                target: target.clone(),
            }),
            (loading, target) => {
                let found = discover::find_inputs(&self.folder, config)?;
                Ok(InputFiles {
                    loading: loading.clone().unwrap_or(found.loading),
                    target: target.clone().unwrap_or(found.target),
                })
            }
        }
    }
}

#[derive(Debug)]
pub struct MergeReport {
    pub inputs: InputFiles,
    pub backup: Option<PathBuf>,
    pub append: AppendOutcome,
    /// Table range after the append, when the ledger has a table.
    pub table_range: Option<String>,
    pub conditional_formats_extended: usize,
    /// `false` for previews.
    pub saved: bool,
    pub hook: HookOutcome,
}

pub fn run<W: Write>(
    request: &MergeRequest,
    config: &AppendConfig,
    progress: &mut dyn ProgressSink,
    hook: &dyn PostProcessHook,
    preview_out: W,
) -> Result<MergeReport> {
    progress.notify(Checkpoint::Started);

    let inputs = request.resolve_inputs(config)?;
    for path in [&inputs.loading, &inputs.target] {
        if !path.exists() {
            return Err(Error::FileNotFound(path.clone()));
        }
    }
    tracing::debug!(loading = %inputs.loading.display(), target = %inputs.target.display(), "inputs");
    // The ledger is saved as xlsx, so only xlsx/xlsm targets can be written back.
    reader::ensure_saveable(&inputs.target)?;

    let rows = reader::read_source_rows(&inputs.loading, config)?;
    if rows.is_empty() {
        return Err(Error::NoSourceRows(inputs.loading.clone()));
    }
    progress.notify(Checkpoint::SourceLoaded { rows: rows.len() });

    let backup = if request.backup && request.preview.is_none() {
        Some(discover::create_backup(&inputs.target)?)
    } else {
        None
    };

    let mut book = reader::open_workbook(&inputs.target)?;
    let sheet_names: Vec<String> = (0..book.get_sheet_count())
        .filter_map(|i| book.get_sheet(&i))
        .map(|s| s.get_name().to_string())
        .collect();
    let sheet = book
        .get_sheet_by_name_mut(&config.sheet_name)
        .ok_or_else(|| Error::SheetNotFound {
            name: config.sheet_name.clone(),
            available: sheet_names.join(", "),
        })?;

    let region = table::capture_table(sheet);
    if let Some(r) = &region {
        tracing::debug!(table = %r.name, range = %r.range(), header = r.header_row, "table found");
    }
    let append = LedgerAppender::new(&config.date_columns).append(sheet, &rows, region.as_ref())?;
    let table_range = region
        .as_ref()
        .and_then(|r| table::extend_table(sheet, r, append.new_last_row));
    let conditional_formats_extended =
        table::extend_conditional_formatting(sheet, append.new_last_row);
    progress.notify(Checkpoint::RowsWritten {
        first: append.start_row,
        last: append.new_last_row,
    });

    if let Some(preview) = &request.preview {
        writer::write_rows(sheet, append.start_row, append.new_last_row, preview_out, preview)?;
        return Ok(MergeReport {
            inputs,
            backup,
            append,
            table_range,
            conditional_formats_extended,
            saved: false,
            hook: HookOutcome::Skipped,
        });
    }

    umya_spreadsheet::writer::xlsx::write(&book, &inputs.target).map_err(|e| {
        Error::InvalidExcel {
            path: inputs.target.clone(),
            details: format!("save failed: {}", e),
        }
    })?;
    progress.notify(Checkpoint::Saved {
        path: inputs.target.clone(),
    });

    let hook_outcome = hook.run(&inputs.target);
    progress.notify(Checkpoint::HookResult(hook_outcome.clone()));

    Ok(MergeReport {
        inputs,
        backup,
        append,
        table_range,
        conditional_formats_extended,
        saved: true,
        hook: hook_outcome,
    })
}
