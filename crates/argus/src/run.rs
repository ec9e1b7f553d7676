use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use swc_core::{
    common::{FileName, SourceMap, Spanned, sync::Lrc},
    ecma::{
        ast::EsVersion,
        parser::{Parser, StringInput, Syntax, lexer::Lexer},
    },
};

use crate::{
    hooks::{NO_INSTRUMENT_MARKER, RUNTIME_GLOBAL},
    location::convert_span,
    registry::IdRegistry,
    transform::{TransformError, transform_script},
};

/// The tool name stamped into preambles and derived file names.
pub const TOOL_NAME: &str = "argus";

/// Result of one transformation: the full output text (preamble included)
/// and the registry holding every allocated id with its source coordinates.
#[derive(Debug)]
pub struct InstrumentedOutput {
    pub code: String,
    pub registry: IdRegistry,
}

/// Error type for whole-file instrumentation, separating failures by stage.
///
/// Keeping I/O and transform failures distinct lets callers handle user
/// feedback and recovery accurately without string matching.
#[derive(Debug)]
pub enum InstrumentError {
    /// Parsing or rewriting the source failed.
    Transform(TransformError),
    /// Reading the input or writing the derived file failed.
    Io { path: PathBuf, error: io::Error },
}

impl fmt::Display for InstrumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform(error) => write!(f, "{error}"),
            Self::Io { path, error } => write!(f, "{}: {error}", path.display()),
        }
    }
}

impl std::error::Error for InstrumentError {}

impl From<TransformError> for InstrumentError {
    fn from(error: TransformError) -> Self {
        Self::Transform(error)
    }
}

/// Instruments one source text.
///
/// `orig_path` and `inst_path` are only embedded into the script-enter hook
/// call (and the parser's diagnostics); no file is touched.
///
/// The marker check runs first. Output that already begins with the preamble
/// marker line is returned verbatim, so running the instrumenter on its own
/// output is the identity. A source that merely contains the marker somewhere
/// is returned as preamble + source, with the walk skipped.
pub fn instrument_source(source: &str, orig_path: &str, inst_path: &str) -> Result<InstrumentedOutput, TransformError> {
    if source.starts_with(&format!("// {NO_INSTRUMENT_MARKER}")) {
        return Ok(InstrumentedOutput {
            code: source.to_owned(),
            registry: IdRegistry::new(Lrc::default()),
        });
    }
    if source.contains(NO_INSTRUMENT_MARKER) {
        let registry = IdRegistry::new(Lrc::default());
        let mut code = preamble(&registry.serialized_table());
        code.push_str(source);
        return Ok(InstrumentedOutput { code, registry });
    }

    let cm: Lrc<SourceMap> = Lrc::default();
    let fm = cm.new_source_file(FileName::Custom(orig_path.to_owned()).into(), source.to_owned());
    let lexer = Lexer::new(
        Syntax::Es(Default::default()),
        EsVersion::Es2022,
        StringInput::from(&*fm),
        None,
    );
    let mut parser = Parser::new_from(lexer);
    let script = parser.parse_script().map_err(|e| parse_error(&cm, e))?;
    if let Some(error) = parser.take_errors().into_iter().next() {
        return Err(parse_error(&cm, error));
    }

    let registry = IdRegistry::new(cm.clone());
    let (body, registry) = transform_script(&script, registry, orig_path, inst_path)?;
    let mut code = preamble(&registry.serialized_table());
    code.push_str(&body);
    Ok(InstrumentedOutput { code, registry })
}

/// Instruments one file and writes the derived file beside it.
///
/// Returns the derived path, `<stem>__argus__.<ext>` in the input's
/// directory.
pub fn instrument_file(path: &Path) -> Result<PathBuf, InstrumentError> {
    let source = fs::read_to_string(path).map_err(|error| InstrumentError::Io {
        path: path.to_owned(),
        error,
    })?;
    let out_path = output_path_for(path);
    let output = instrument_source(&source, &path.to_string_lossy(), &out_path.to_string_lossy())?;
    fs::write(&out_path, output.code).map_err(|error| InstrumentError::Io {
        path: out_path.clone(),
        error,
    })?;
    Ok(out_path)
}

/// The derived file name for an input path.
#[must_use]
pub fn output_path_for(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("script");
    let name = match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{stem}__{TOOL_NAME}__.{ext}"),
        None => format!("{stem}__{TOOL_NAME}__"),
    };
    path.with_file_name(name)
}

/// The fixed preamble: the marker (so re-instrumentation short-circuits),
/// the id table, and the tool stamp.
fn preamble(table: &str) -> String {
    format!("// {NO_INSTRUMENT_MARKER}\n{RUNTIME_GLOBAL}.ids = {table};\n// INSTRUMENTED BY {TOOL_NAME}\n")
}

fn parse_error(cm: &SourceMap, error: swc_core::ecma::parser::error::Error) -> TransformError {
    let position = convert_span(cm, error.span());
    TransformError::syntax(error.into_kind().msg(), position)
}
