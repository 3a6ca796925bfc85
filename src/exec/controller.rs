use crate::config::options::ExecutionOptions;
use crate::config::paths::PathResolver;
use crate::config::types::{ExecutionSource, LifecycleState, Result, ScriptError};
use crate::config::validator::validate_inputs;
use crate::core::context::NativeTypeDelegate;
use crate::core::model::ModelHandle;
use crate::core::stream::Stream;
use crate::core::value::{Parameter, Parameters};
/// Execution controller: drives one language executor through a run
use crate::exec::handle::DeferredRun;
use crate::exec::stages::Execution;
use crate::language::executor::LanguageExecutor;
use crate::observability::metrics::get_metrics;
use crate::observability::probe::{EnvironmentProbe, SystemProbe};
use crate::observability::timing::ExecutionTimeData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Owns a program source, its inputs and the executor that runs it.
///
/// A controller runs once. The `with_*` stream builders hand back a fresh
/// controller over the same executor and inputs, ready for another run.
pub struct ExecutionController<E: LanguageExecutor> {
    run_id: Uuid,
    executor: E,
    source: ExecutionSource,
    models: Vec<ModelHandle>,
    parameters: Parameters,
    delegates: Vec<Arc<dyn NativeTypeDelegate>>,
    options: ExecutionOptions,
    probe: Arc<dyn EnvironmentProbe>,
    output: Option<Stream>,
    warning: Option<Stream>,
    error: Option<Stream>,
    time_data: Option<ExecutionTimeData>,
    state: LifecycleState,
}

impl<E: LanguageExecutor> ExecutionController<E> {
    pub fn builder(executor: E) -> ControllerBuilder<E> {
        ControllerBuilder::new(executor)
    }

    pub fn for_script<P: Into<PathBuf>>(executor: E, path: P) -> Self {
        Self::builder(executor).script(path).build()
    }

    pub fn for_code<S: Into<String>>(executor: E, code: S) -> Self {
        Self::builder(executor).code(code).build()
    }

    /// Run every stage in order and return the executor's result.
    ///
    /// Any failure aborts the remaining stages and leaves the controller in
    /// [`LifecycleState::Failed`]. Disposal is left to the caller either way.
    pub fn run(&mut self) -> Result<E::Output> {
        if self.state != LifecycleState::Constructed {
            return Err(ScriptError::Config(format!(
                "controller {} cannot run from state {:?}",
                self.run_id, self.state
            )));
        }

        log::info!("Executing engine.");
        log::debug!("run {} with {}", self.run_id, self.executor.language());

        let metrics = get_metrics();
        metrics.record_run_start();
        let started = Instant::now();

        match self.run_stages() {
            Ok(output) => {
                metrics.record_success(started.elapsed());
                Ok(output)
            }
            Err(e) => {
                metrics.record_failure(&e, started.elapsed());
                self.state = LifecycleState::Failed;
                Err(e)
            }
        }
    }

    fn run_stages(&mut self) -> Result<E::Output> {
        validate_inputs(&self.source, &self.parameters).into_result()?;

        if let Some(time_data) = self.time_data.as_mut() {
            time_data.log_start();
        }
        self.apply_redirects();

        let source = self
            .source
            .resolve()
            .ok_or_else(|| ScriptError::Config("No script or code to execute".to_string()))?;

        let parsed = Execution::new(&mut self.executor, self.time_data.as_mut()).parse(source)?;
        self.state = LifecycleState::Parsed;

        let prepared = parsed.prepare(&self.models, &self.parameters, &self.delegates);
        self.state = LifecycleState::Prepared;

        let pre_processed = prepared.pre_process()?;
        self.state = LifecycleState::PreProcessed;

        let (executed, output) = pre_processed.execute()?;
        self.state = LifecycleState::Executed;

        let post_processed = executed.post_process()?;
        self.state = LifecycleState::PostProcessed;

        post_processed.finish();
        Ok(output)
    }

    fn apply_redirects(&mut self) {
        if let Some(stream) = &self.output {
            self.executor.redirect_output(stream.clone());
        }
        if let Some(stream) = &self.warning {
            self.executor.redirect_warning(stream.clone());
        }
        if let Some(stream) = &self.error {
            self.executor.redirect_error(stream.clone());
        }
    }

    /// Release models and the executor context. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.options.dispose_models {
            log::info!("Disposing models");
            self.executor.dispose_model_repository();
        } else {
            log::info!("Removing models from context models");
            self.executor.clear_model_repository();
        }
        self.models.clear();
        self.parameters.clear();

        log::info!("Dispose context");
        self.executor.dispose();
        self.state = LifecycleState::Disposed;
        get_metrics().disposals.inc();
    }

    /// Send program output to `stream` from the next run on
    pub fn with_output(mut self, stream: Stream) -> Self {
        self.output = Some(stream);
        self.renewed()
    }

    pub fn with_warning(mut self, stream: Stream) -> Self {
        self.warning = Some(stream);
        self.renewed()
    }

    pub fn with_error(mut self, stream: Stream) -> Self {
        self.error = Some(stream);
        self.renewed()
    }

    fn renewed(mut self) -> Self {
        self.run_id = Uuid::new_v4();
        self.state = LifecycleState::Constructed;
        self.time_data = self
            .options
            .profile_execution
            .then(|| ExecutionTimeData::new(self.probe.as_ref()));
        self
    }

    /// Defer the run so it can be driven inline or on its own thread
    pub fn run_async(self) -> DeferredRun<E> {
        DeferredRun::new(self)
    }

    pub fn execution_time_data(&self) -> Option<&ExecutionTimeData> {
        self.time_data.as_ref()
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    pub fn source(&self) -> &ExecutionSource {
        &self.source
    }

    pub fn models(&self) -> &[ModelHandle] {
        &self.models
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn options(&self) -> ExecutionOptions {
        self.options
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

/// Collects a controller's inputs. Nothing is checked until `run`.
pub struct ControllerBuilder<E: LanguageExecutor> {
    executor: E,
    source: ExecutionSource,
    models: Vec<ModelHandle>,
    parameters: Parameters,
    delegates: Vec<Arc<dyn NativeTypeDelegate>>,
    options: ExecutionOptions,
    probe: Option<Arc<dyn EnvironmentProbe>>,
    output: Option<Stream>,
    warning: Option<Stream>,
    error: Option<Stream>,
}

impl<E: LanguageExecutor> ControllerBuilder<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            source: ExecutionSource::default(),
            models: Vec::new(),
            parameters: Parameters::new(),
            delegates: Vec::new(),
            options: ExecutionOptions::default(),
            probe: None,
            output: None,
            warning: None,
            error: None,
        }
    }

    pub fn script<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.source.script = Some(path.into());
        self
    }

    /// Script path resolved against `resolver` first
    pub fn script_relative<P: AsRef<Path>>(self, path: P, resolver: &dyn PathResolver) -> Self {
        let resolved = resolver.resolve(path.as_ref());
        self.script(resolved)
    }

    pub fn code<S: Into<String>>(mut self, code: S) -> Self {
        self.source.code = Some(code.into());
        self
    }

    pub fn model(mut self, model: ModelHandle) -> Self {
        self.models.push(model);
        self
    }

    pub fn models<I: IntoIterator<Item = ModelHandle>>(mut self, models: I) -> Self {
        self.models.extend(models);
        self
    }

    pub fn parameter<N: Into<String>, P: Into<Parameter>>(mut self, name: N, value: P) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn parameters(mut self, parameters: Parameters) -> Self {
        self.parameters.extend(parameters);
        self
    }

    pub fn native_delegate(mut self, delegate: Arc<dyn NativeTypeDelegate>) -> Self {
        self.delegates.push(delegate);
        self
    }

    pub fn dispose_models(mut self, dispose: bool) -> Self {
        self.options.dispose_models = dispose;
        self
    }

    pub fn profile_execution(mut self, profile: bool) -> Self {
        self.options.profile_execution = profile;
        self
    }

    pub fn options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    /// Host metadata source for profiling, the running machine by default
    pub fn probe(mut self, probe: Arc<dyn EnvironmentProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn output(mut self, stream: Stream) -> Self {
        self.output = Some(stream);
        self
    }

    pub fn warning(mut self, stream: Stream) -> Self {
        self.warning = Some(stream);
        self
    }

    pub fn error(mut self, stream: Stream) -> Self {
        self.error = Some(stream);
        self
    }

    pub fn build(self) -> ExecutionController<E> {
        let probe = self.probe.unwrap_or_else(|| Arc::new(SystemProbe));
        // host metadata is captured here, not at run time
        let time_data = self
            .options
            .profile_execution
            .then(|| ExecutionTimeData::new(probe.as_ref()));

        ExecutionController {
            run_id: Uuid::new_v4(),
            executor: self.executor,
            source: self.source,
            models: self.models,
            parameters: self.parameters,
            delegates: self.delegates,
            options: self.options,
            probe,
            output: self.output,
            warning: self.warning,
            error: self.error,
            time_data,
            state: LifecycleState::Constructed,
        }
    }
}
