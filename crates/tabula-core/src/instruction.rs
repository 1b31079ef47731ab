//! Instruction rows and records -- the unit of execution.

use serde::{Deserialize, Serialize};
use tabula_vars::VariableEnvironment;
use tabula_vars::date::is_date_token;

use crate::enums::{Activation, Status};
use crate::params::{ParamSyntax, Parameters};
use crate::policy::PostTestPolicy;

/// One tabular instruction exactly as supplied by a row source.
///
/// All fields are opaque strings; blank is the default for every field.
/// Field order matches the eight-column row format:
/// `id, action, locatorKind, locatorSpec, queryFunction, activationFlag,
/// parameters, description`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionRow {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub action: String,

    #[serde(default, alias = "locatorKind", skip_serializing_if = "String::is_empty")]
    pub locator_kind: String,

    #[serde(default, alias = "locatorSpec", skip_serializing_if = "String::is_empty")]
    pub locator_spec: String,

    #[serde(default, alias = "queryFunction", skip_serializing_if = "String::is_empty")]
    pub query_function: String,

    #[serde(
        default,
        alias = "activationFlag",
        alias = "active",
        skip_serializing_if = "String::is_empty"
    )]
    pub activation: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parameters: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl InstructionRow {
    /// Number of columns in the tabular format.
    pub const FIELD_COUNT: usize = 8;

    pub fn new(id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn with_params(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = parameters.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_activation(mut self, activation: impl Into<String>) -> Self {
        self.activation = activation.into();
        self
    }

    pub fn with_locator(mut self, kind: impl Into<String>, spec: impl Into<String>) -> Self {
        self.locator_kind = kind.into();
        self.locator_spec = spec.into();
        self
    }

    pub fn with_query(mut self, query_function: impl Into<String>) -> Self {
        self.query_function = query_function.into();
        self
    }

    /// Build a row from positional fields, padding missing ones with blanks.
    /// Fields beyond the eighth are ignored.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Self {
        let field = |i: usize| fields.get(i).map(|f| f.as_ref().to_string()).unwrap_or_default();
        Self {
            id: field(0),
            action: field(1),
            locator_kind: field(2),
            locator_spec: field(3),
            query_function: field(4),
            activation: field(5),
            parameters: field(6),
            description: field(7),
        }
    }

    /// The row as positional fields.
    pub fn fields(&self) -> [&str; Self::FIELD_COUNT] {
        [
            &self.id,
            &self.action,
            &self.locator_kind,
            &self.locator_spec,
            &self.query_function,
            &self.activation,
            &self.parameters,
            &self.description,
        ]
    }

    /// A row without an action is not an instruction at all.
    pub fn is_empty(&self) -> bool {
        self.action.trim().is_empty()
    }
}

/// Where a record sits within the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPosition {
    /// 1-based position within its program.
    pub seq: usize,
    /// Nesting depth; the outermost program is level 1.
    pub level: usize,
    /// Session step number of the instruction that spawned this program
    /// (0 at the root).
    pub parent_step: u64,
    /// Session-wide step number of this instruction.
    pub step: u64,
}

/// Serializable snapshot of an executed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub seq: usize,
    pub level: usize,
    pub step: u64,
    pub parent_step: u64,
    pub id: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

/// An instruction row plus everything that happens to it during execution.
#[derive(Debug, Clone)]
pub struct InstructionRecord {
    row: InstructionRow,
    position: StepPosition,
    initialized: bool,

    // Resolved at initialize().
    description: String,
    parameters_text: String,
    activation: Activation,
    forced_skip: bool,

    // Resolved at resolve_params(), for dispatched records only.
    params: Parameters,
    policy: PostTestPolicy,

    // Execution results.
    comments: Vec<String>,
    errors: Vec<String>,
    exception: Option<String>,
}

impl From<InstructionRow> for InstructionRecord {
    fn from(row: InstructionRow) -> Self {
        Self::new(row)
    }
}

impl InstructionRecord {
    pub fn new(row: InstructionRow) -> Self {
        Self {
            description: row.description.clone(),
            parameters_text: row.parameters.clone(),
            row,
            position: StepPosition::default(),
            initialized: false,
            params: Parameters::default(),
            activation: Activation::Unset,
            policy: PostTestPolicy::default(),
            forced_skip: false,
            comments: Vec::new(),
            errors: Vec::new(),
            exception: None,
        }
    }

    // -- Row fields ---------------------------------------------------------

    pub fn row(&self) -> &InstructionRow {
        &self.row
    }

    pub fn id(&self) -> &str {
        &self.row.id
    }

    pub fn action(&self) -> &str {
        self.row.action.trim()
    }

    pub fn locator_kind(&self) -> &str {
        &self.row.locator_kind
    }

    pub fn locator_spec(&self) -> &str {
        &self.row.locator_spec
    }

    pub fn query_function(&self) -> &str {
        &self.row.query_function
    }

    /// True when the action is blank: the row is skipped without counting.
    pub fn is_empty(&self) -> bool {
        self.row.is_empty()
    }

    // -- Initialization -----------------------------------------------------

    /// Bind the record to its position and resolve it against `env`.
    ///
    /// Substitutes `{var}` placeholders in the description, activation flag
    /// and parameter blob using the environment as it is right now. The
    /// parameters themselves are left unparsed until
    /// [`resolve_params`](Self::resolve_params), so a record that ends up
    /// skipped never records setup errors or touches the environment.
    pub fn initialize(&mut self, position: StepPosition, env: &VariableEnvironment) {
        self.position = position;
        self.description = env.substitute(&self.row.description);
        self.parameters_text = env.substitute(&self.row.parameters);

        let flag = env.substitute(&self.row.activation);
        self.activation = match Activation::parse(&flag) {
            Some(activation) => activation,
            None => {
                self.record_comment(format!(
                    "unrecognised activation flag '{}', treating as active",
                    flag.trim()
                ));
                Activation::Active
            }
        };

        self.initialized = true;
    }

    /// Parse the parameter blob of a record that is about to be dispatched.
    ///
    /// Values are substituted after splitting, `%date...%` values are
    /// expanded (which writes the date bundle into `env`), and
    /// `OnPass`/`OnFail` are read into the post-test policy. Setup problems
    /// are recorded as errors on the record.
    pub fn resolve_params(&mut self, env: &mut VariableEnvironment, syntax: &ParamSyntax) {
        self.params = match Parameters::parse(&self.row.parameters, syntax) {
            Ok(mut params) => {
                params.map_values(|_, value| env.substitute(value));
                params
            }
            Err(e) => {
                self.record_error(format!("invalid parameters: {e}"));
                Parameters::default()
            }
        };

        let tokens: Vec<(String, String)> = self
            .params
            .iter()
            .filter(|(_, value)| is_date_token(value))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        for (key, token) in tokens {
            match env.expand_date_token(&token) {
                Ok(expansion) => self.params.set(&key, expansion.value),
                Err(e) => self.record_error(format!("parameter '{key}': {e}")),
            }
        }

        self.policy = match PostTestPolicy::from_params(&self.params) {
            Ok(policy) => policy,
            Err(e) => {
                self.record_error(e.to_string());
                PostTestPolicy::default()
            }
        };
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn position(&self) -> StepPosition {
        self.position
    }

    pub fn seq(&self) -> usize {
        self.position.seq
    }

    pub fn level(&self) -> usize {
        self.position.level
    }

    pub fn step(&self) -> u64 {
        self.position.step
    }

    pub fn parent_step(&self) -> u64 {
        self.position.parent_step
    }

    // -- Resolved fields ----------------------------------------------------

    /// Description after substitution (raw before initialize).
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Parameter blob after substitution (raw before initialize).
    pub fn parameters(&self) -> &str {
        &self.parameters_text
    }

    /// Parsed parameters (empty until resolved, or on a setup error).
    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn policy(&self) -> PostTestPolicy {
        self.policy
    }

    /// Whether the record will be dispatched.
    pub fn is_active(&self) -> bool {
        !self.forced_skip && self.activation.is_active()
    }

    /// Override the activation flag to skip this record.
    pub fn force_skip(&mut self, reason: impl Into<String>) {
        self.forced_skip = true;
        self.record_comment(reason);
    }

    // -- Results ------------------------------------------------------------

    pub fn record_comment(&mut self, message: impl Into<String>) {
        self.comments.push(message.into());
    }

    /// Append an error. An error identical to the previous one is dropped.
    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.errors.last() != Some(&message) {
            self.errors.push(message);
        }
    }

    pub fn record_exception(&mut self, exception: impl Into<String>) {
        self.exception = Some(exception.into());
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.exception.is_some()
    }

    /// `FAIL` if any error or exception was recorded, otherwise `SKIP` if
    /// the record is inactive, otherwise `PASS`.
    pub fn status(&self) -> Status {
        if self.has_errors() {
            Status::Fail
        } else if !self.is_active() {
            Status::Skip
        } else {
            Status::Pass
        }
    }

    pub fn result(&self) -> StepResult {
        StepResult {
            seq: self.position.seq,
            level: self.position.level,
            step: self.position.step,
            parent_step: self.position.parent_step,
            id: self.row.id.clone(),
            action: self.action().to_string(),
            description: self.description.clone(),
            status: self.status(),
            comments: self.comments.clone(),
            errors: self.errors.clone(),
            exception: self.exception.clone(),
        }
    }
}
