use clap::Parser;
use demproc::core::derive::PlannedStage;
use demproc::domain::ports::{OutputConfig, ToolConfig};
use demproc::utils::error::{DemError, ErrorSeverity};
use demproc::utils::{logger, validation::Validate};
use demproc::{CliConfig, Command, DemProcessor, DemprocConfig, LayerMaker, ProcessRunner};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting demproc");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入並驗證配置
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    if let Err(e) = run(cli, config).await {
        exit_with(&e);
    }
}

fn load_config(path: Option<&str>) -> demproc::Result<DemprocConfig> {
    let config = match path {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            DemprocConfig::from_file(path)?
        }
        None => DemprocConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

async fn run(cli: CliConfig, mut config: DemprocConfig) -> demproc::Result<()> {
    let monitor_enabled = cli.monitor || config.monitoring_enabled();
    let runner = ProcessRunner::new().with_timeout(config.timeout_seconds().map(Duration::from_secs));

    match cli.command {
        Command::DeriveAll {
            dem,
            site,
            output_root,
            trim,
            skip,
            execution_id,
            dry_run,
        } => {
            // 應用命令列覆蓋設定
            if let Some(root) = output_root {
                config.output.root = Some(root);
            }
            if let Some(n) = trim {
                config.output.trim_edge = Some(n);
            }
            config.validate()?;

            let mut processor = DemProcessor::new(runner, config)
                .with_skip(skip)
                .with_monitoring(monitor_enabled);
            if let Some(id) = execution_id {
                processor = processor.with_execution_id(id);
            }

            let dem = PathBuf::from(dem);
            if dry_run {
                tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
                display_plan(&processor.plan(&dem, &site)?);
                return Ok(());
            }

            let report = processor.derive_all(&dem, &site).await?;
            println!("✅ Derived {} layer(s) for '{}'", report.executed_layers().len(), site);
            for stage in &report.stages {
                let marker = if stage.skipped { "⏭️" } else { "📁" };
                println!("  {} {}: {}", marker, stage.layer, stage.output_path.display());
            }
        }
        Command::HydroCorrect { dem, output } => {
            let maker = LayerMaker::new(runner, config);
            let out = maker.make_hydro_correct_dem(Path::new(&dem), output.as_deref().map(Path::new)).await?;
            print_written(&out);
        }
        Command::FlowDirection { dem, output } => {
            let keep = config.keep_flow_slope();
            let maker = LayerMaker::new(runner, config).with_keep_flow_slope(keep);
            let out = maker.make_flow_direction_map(Path::new(&dem), output.as_deref().map(Path::new)).await?;
            print_written(&out);
        }
        Command::Slope { dem, output } => {
            let maker = LayerMaker::new(runner, config);
            let out = maker.make_slope_map(Path::new(&dem), output.as_deref().map(Path::new)).await?;
            print_written(&out);
        }
        Command::ContinuousAspect { dem, output } => {
            let maker = LayerMaker::new(runner, config);
            let out = maker
                .make_continuous_aspect_map(Path::new(&dem), output.as_deref().map(Path::new))
                .await?;
            print_written(&out);
        }
        Command::BinaryAspect { continuous_aspect, output } => {
            let maker = LayerMaker::new(runner, config);
            let out = maker
                .make_binary_aspect_map(Path::new(&continuous_aspect), output.as_deref().map(Path::new))
                .await?;
            print_written(&out);
        }
        Command::Trim { src, tgt, n } => {
            demproc::trim_geotiff_edge(&src, &tgt, n)?;
            print_written(Path::new(&tgt));
        }
    }

    Ok(())
}

fn print_written(path: &Path) {
    println!("📁 Output saved to: {}", path.display());
}

fn display_plan(plan: &[PlannedStage]) {
    println!("📋 Derivation plan:");
    for (idx, stage) in plan.iter().enumerate() {
        let status = if stage.skipped { " (skipped)" } else { "" };
        println!("  {}. {}{}", idx + 1, stage.layer.description(), status);
        println!("     {}", stage.action);
    }
    println!();
    println!("✅ Dry run complete. Use --verbose for tool output during an actual run.");
}

fn exit_with(e: &DemError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ demproc failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
