use anyhow::{Context, Result};
use bizops::{
    actions::ActionRegistry,
    cli::{
        commands::{to_fields, BusinessesCommand, FormCommand, JobsCommand, TriggerCommand, ValidateCommand},
        output::*,
        Cli, Command,
    },
    core::{BusinessConfig, DomainError, Fields, PipelineResult, ResourceContext},
    diagnostics::TracingErrorReporter,
    execution::{PipelineRunner, RunEvent},
    persistence::{InMemoryJobStore, JobStore},
    services::{FormEventRequest, FormEventsService, TriggerRequest, TriggersService},
    store::{ConfigStore, FileConfigSource},
    validation::check_config,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG overrides --verbose
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_signal.cancel();
        }
    });

    let app = App::new(&cli).await?;

    let ok = match &cli.command {
        Command::Form(cmd) => run_form(&app, cmd, &cancel).await?,
        Command::Trigger(cmd) => run_trigger(&app, cmd, &cancel).await?,
        Command::Validate(cmd) => validate_config(&app, cmd, &cancel).await?,
        Command::Businesses(cmd) => list_businesses(&app, cmd, &cancel).await?,
        Command::Jobs(cmd) => show_jobs(&app, cmd).await?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Long-lived collaborators built once from the global options
struct App {
    config: Arc<ConfigStore>,
    registry: Arc<ActionRegistry>,
    jobs: Arc<dyn JobStore>,
}

impl App {
    async fn new(cli: &Cli) -> Result<Self> {
        debug!("Reading configuration from {}", cli.config_dir.display());
        let source = FileConfigSource::new(&cli.config_dir);

        Ok(Self {
            config: Arc::new(ConfigStore::new(Arc::new(source))),
            registry: Arc::new(ActionRegistry::with_builtins()),
            jobs: open_job_store(cli).await?,
        })
    }

    /// Runner that prints progress unless JSON output was requested
    fn runner(&self, json: bool) -> Arc<PipelineRunner> {
        let runner = PipelineRunner::new(Arc::clone(&self.registry));
        if json {
            return Arc::new(runner);
        }

        let spinner = create_spinner("starting");
        Arc::new(runner.with_event_handler(move |event| {
            match event {
                RunEvent::Started { pipeline_key, .. } => spinner.set_message(pipeline_key.clone()),
                RunEvent::StepFinished { .. } => spinner.println(format_run_event(event)),
                RunEvent::Finished { .. } => spinner.finish_and_clear(),
            }
        }))
    }
}

async fn open_job_store(cli: &Cli) -> Result<Arc<dyn JobStore>> {
    if cli.memory {
        return Ok(Arc::new(InMemoryJobStore::new()));
    }
    open_database(cli).await
}

#[cfg(feature = "sqlite")]
async fn open_database(cli: &Cli) -> Result<Arc<dyn JobStore>> {
    use bizops::persistence::SqliteJobStore;

    let store = match &cli.db {
        Some(path) => SqliteJobStore::open(path).await?,
        None => SqliteJobStore::with_default_path().await?,
    };
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
async fn open_database(_cli: &Cli) -> Result<Arc<dyn JobStore>> {
    warn!("Built without sqlite support; jobs are kept in memory");
    Ok(Arc::new(InMemoryJobStore::new()))
}

async fn run_form(app: &App, cmd: &FormCommand, cancel: &CancellationToken) -> Result<bool> {
    let mut fields = match &cmd.fields_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str::<Fields>(&content)
                .with_context(|| format!("{} is not a JSON object", path.display()))?
        }
        None => Fields::new(),
    };
    fields.extend(to_fields(&cmd.field));

    let request = FormEventRequest {
        business_id: cmd.business.clone(),
        pipeline_key: cmd.pipeline.clone().unwrap_or_default(),
        source: cmd.source.clone().unwrap_or_default(),
        dry_run: cmd.dry_run,
        fields,
        options: to_fields(&cmd.option),
        request_id: cmd.request_id.clone().unwrap_or_default(),
    };

    let service = FormEventsService::new(
        Arc::clone(&app.config),
        app.runner(cmd.json),
        Arc::clone(&app.jobs),
        Arc::new(TracingErrorReporter),
    );
    report_run(service.run(request, cancel).await, cmd.json)
}

async fn run_trigger(app: &App, cmd: &TriggerCommand, cancel: &CancellationToken) -> Result<bool> {
    let resource = cmd.resource_type.as_ref().map(|kind| ResourceContext {
        kind: kind.clone(),
        board_id: cmd.board_id,
        item_id: cmd.item_id,
        data: Fields::new(),
    });

    let request = TriggerRequest {
        business_id: cmd.business.clone(),
        trigger_key: cmd.trigger.clone().unwrap_or_default(),
        pipeline_key: cmd.pipeline.clone().unwrap_or_default(),
        source: cmd.source.clone().unwrap_or_default(),
        resource,
        payload: to_fields(&cmd.payload),
        dry_run: cmd.dry_run,
        request_id: cmd.request_id.clone().unwrap_or_default(),
    };

    let service = TriggersService::new(
        Arc::clone(&app.config),
        app.runner(cmd.json),
        Arc::clone(&app.jobs),
        Arc::new(TracingErrorReporter),
    );
    report_run(service.run(request, cancel).await, cmd.json)
}

/// Print a run outcome; returns whether the run succeeded
fn report_run(outcome: Result<PipelineResult, DomainError>, json: bool) -> Result<bool> {
    match outcome {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", format_result(&result));
                println!("{} Job {}", INFO, style(&result.job_id).dim());
            }
            Ok(result.success)
        }
        Err(e) => {
            if json {
                let data = serde_json::json!({
                    "success": false,
                    "code": e.code().as_str(),
                    "error": e.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{} {}", CROSS, style(&e).red());
            }
            Ok(false)
        }
    }
}

async fn validate_config(app: &App, cmd: &ValidateCommand, cancel: &CancellationToken) -> Result<bool> {
    let issues = check_config(&app.config, &app.registry, cancel)
        .await
        .context("Failed to enumerate configuration")?;

    let valid = issues.is_empty();
    if cmd.json {
        let data = serde_json::json!({ "valid": valid, "issues": issues });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else if valid {
        println!("{} Configuration is valid!", CHECK);
    } else {
        println!("{} Found {} problem(s):", CROSS, style(issues.len()).red());
        for issue in &issues {
            println!("{}", format_issue(issue));
        }
    }

    Ok(valid)
}

async fn list_businesses(app: &App, cmd: &BusinessesCommand, cancel: &CancellationToken) -> Result<bool> {
    let businesses = app
        .config
        .load_all_businesses(cancel)
        .await
        .context("Failed to list businesses")?;

    if cmd.json {
        let data: Vec<&BusinessConfig> = businesses.iter().map(|b| b.as_ref()).collect();
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(true);
    }

    if businesses.is_empty() {
        println!("{} No businesses configured", INFO);
        return Ok(true);
    }

    println!("{} Businesses:", INFO);
    for business in &businesses {
        println!("{}", format_business(business));
    }
    Ok(true)
}

async fn show_jobs(app: &App, cmd: &JobsCommand) -> Result<bool> {
    if let Some(id) = &cmd.id {
        let job = app.jobs.get_by_id(id).await?;
        return match job {
            Some(job) if cmd.json => {
                println!("{}", serde_json::to_string_pretty(&job)?);
                Ok(true)
            }
            Some(job) => {
                println!("{}", format_job_summary(&job));
                for (index, step) in job.steps.iter().enumerate() {
                    println!("    {}", format_step(index, step));
                }
                Ok(true)
            }
            None => {
                println!("{} Job not found", WARN);
                Ok(false)
            }
        };
    }

    let business_id = cmd.business.as_deref().unwrap_or_default();
    let jobs = app.jobs.get_by_business_id(business_id, cmd.limit).await?;

    if cmd.json {
        let data = serde_json::json!({ "jobs": jobs });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else if jobs.is_empty() {
        println!("{} No jobs found for {}", INFO, style(business_id).bold());
    } else {
        println!("{} Jobs for {}:", INFO, style(business_id).bold());
        for job in &jobs {
            println!("  {}", format_job_summary(job));
        }
    }
    Ok(true)
}
