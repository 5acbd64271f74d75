use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use portfolio_analyzer::config::{self, ApplicationConfig, LogConfig};
use portfolio_analyzer::data_ingestion::{PortfolioValidator, StatementParser};
use portfolio_analyzer::data_provider::{
    Dataset, DatasetLoader, FileDatasetLoader, HttpReturnsFetcher, LeadClient, LeadStep, LeadSubmission,
};
use portfolio_analyzer::domain_types::{risk_category_label, Holding, PortfolioMetrics};
use portfolio_analyzer::optimization::{OptimizationMode, OptimizationResult};
use portfolio_analyzer::risk::{BenchmarkResult, EngineSettings, RiskProfile, RiskProvider, RISK_PROVIDERS};
use portfolio_analyzer::session::{AnalysisState, InputMode, OptimizationState, PortfolioState};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "analyzer", about = "投資組合風險分析與 THOR 混合最佳化工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 解析對帳單（或帶入範本）並執行完整分析
    Analyze {
        /// CSV 或 PDF 對帳單
        #[arg(required_unless_present = "template")]
        file: Option<PathBuf>,

        /// 改用範本持倉
        #[arg(long, conflicts_with = "file")]
        template: Option<String>,

        /// 外部風險問卷供應商
        #[arg(long, requires = "provider_score")]
        provider: Option<RiskProvider>,

        /// 外部風險問卷分數
        #[arg(long)]
        provider_score: Option<f64>,

        /// 最佳化模式 (max-return, min-risk, min-drawdown, target-score)
        #[arg(long, default_value = "min-risk")]
        mode: OptimizationMode,

        /// target-score 模式的目標分數
        #[arg(long)]
        target: Option<u8>,

        /// 直接指定 THOR 合計比例，略過最佳化搜尋
        #[arg(long)]
        blend: Option<f64>,

        /// 以 JSON 輸出報告
        #[arg(long)]
        json: bool,

        /// 聯絡人姓名（與 --email 一起提供時送出潛在客戶資料）
        #[arg(long, requires = "email")]
        name: Option<String>,

        /// 聯絡人電子郵件
        #[arg(long)]
        email: Option<String>,
    },

    /// 列出投資組合範本
    Templates,

    /// 列出支援的風險問卷供應商
    Providers,
}

/// 分析報告
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisReport<'a> {
    holdings: &'a [Holding],
    total_allocation: f64,
    metrics: &'a PortfolioMetrics,
    risk_score: u8,
    risk_category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_risk_score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_profile: Option<RiskProfile>,
    benchmarks: &'a [BenchmarkResult],
    mode: OptimizationMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    optimized: Option<&'a OptimizationResult>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行參數
    let cli = Cli::parse();

    // 初始化配置
    let app_config = config::init_config()?;

    // 初始化日誌系統
    init_logging(&app_config.log)?;

    match cli.command {
        Commands::Analyze {
            file,
            template,
            provider,
            provider_score,
            mode,
            target,
            blend,
            json,
            name,
            email,
        } => {
            let loader = FileDatasetLoader::from_config(&app_config.data);
            let dataset = loader.load_dataset().await.context("無法加載資料集")?;

            let mut portfolio = match (&template, &file) {
                (Some(id), _) => {
                    let template = dataset
                        .catalog
                        .template(id)
                        .ok_or_else(|| anyhow!("找不到範本: {}", id))?;
                    let mut state = PortfolioState::default();
                    state.set_from_template(template);
                    state
                }
                (None, Some(path)) => load_statement(&dataset, path).await?,
                (None, None) => bail!("必須提供對帳單檔案或 --template"),
            };

            if let Some(provider) = provider {
                portfolio.set_provider_score(provider, provider_score);
            }

            if !portfolio.is_valid() {
                bail!("持倉驗證失敗: {}", portfolio.validation_errors().join("; "));
            }

            let mut analysis = prepare_analysis(app_config, dataset, portfolio.holdings()).await;
            let metrics = analysis
                .run_analysis(portfolio.holdings())
                .cloned()
                .context("沒有可用的報酬資料")?;
            let returns_data = analysis.returns_data().context("沒有可用的報酬資料")?;

            let mut optimization = OptimizationState::new(*analysis.settings());
            optimization.compute_grid(analysis.resolved_holdings(), returns_data);
            optimization.set_mode(mode);
            if let Some(target) = target {
                optimization.set_target_score(target);
            }
            match blend {
                Some(value) => optimization.set_slider_value(value),
                None => {
                    optimization.find_optimal_allocation(&metrics);
                }
            }

            let risk_score = metrics.score_or_zero();
            let report = AnalysisReport {
                holdings: portfolio.holdings(),
                total_allocation: portfolio.total_allocation(),
                metrics: &metrics,
                risk_score,
                risk_category: risk_category_label(risk_score),
                provider_risk_score: portfolio.internal_risk_score(),
                provider_profile: portfolio.risk_profile(),
                benchmarks: analysis.benchmarks(),
                mode: optimization.mode(),
                optimized: optimization.current_result(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }

            if let (Some(name), Some(email)) = (name, email) {
                submit_lead(app_config, &portfolio, &report, name, email).await;
            }
        }
        Commands::Templates => {
            let loader = FileDatasetLoader::from_config(&app_config.data);
            let catalog = loader.load_catalog().await.context("無法加載範本")?;
            for template in &catalog.templates {
                println!(
                    "{:<20} {:<32} 預期風險 {:>3.0}  股 {:.0} / 債 {:.0} / 其他 {:.0}",
                    template.id, template.name, template.expected_risk, template.equity, template.bonds, template.other
                );
            }
        }
        Commands::Providers => {
            for scale in RISK_PROVIDERS.iter() {
                println!(
                    "{:<16} {:<24} {:>5} - {:<5} {}",
                    scale.id, scale.name, scale.min, scale.max, scale.unit
                );
            }
        }
    }

    Ok(())
}

/// 讀取並解析對帳單，副檔名為 .pdf 時以 PDF 處理，其餘視為 CSV 文字
async fn load_statement(dataset: &Dataset, path: &Path) -> Result<PortfolioState> {
    let parser = StatementParser::new(dataset.policy.clone());
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    let (mut result, mode) = if is_pdf {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("無法讀取檔案: {}", path.display()))?;
        (parser.parse_pdf(bytes).await, InputMode::Pdf)
    } else {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("無法讀取檔案: {}", path.display()))?;
        (parser.parse_csv(&text), InputMode::Csv)
    };

    dataset.catalog.enrich(&mut result.holdings);
    info!("從 {} 解析出 {} 筆持倉", path.display(), result.holdings.len());

    let mut state = PortfolioState::new(PortfolioValidator::for_parsed());
    state.set_from_parse(result, mode).map_err(|message| anyhow!(message))?;
    Ok(state)
}

/// 建立分析狀態，啟用按需取得時先補齊缺少的序列
async fn prepare_analysis(app_config: &ApplicationConfig, dataset: Dataset, holdings: &[Holding]) -> AnalysisState {
    let mut analysis = AnalysisState::new(EngineSettings::from(&app_config.engine), dataset.policy);
    analysis.set_returns_data(dataset.returns);

    if app_config.fetch.enabled {
        match HttpReturnsFetcher::new(&app_config.fetch) {
            Ok(fetcher) => {
                analysis.fetch_missing(&fetcher, holdings).await;
            }
            Err(err) => warn!("無法建立報酬序列取得客戶端: {}", err),
        }
    }
    analysis
}

async fn submit_lead(
    app_config: &ApplicationConfig,
    portfolio: &PortfolioState,
    report: &AnalysisReport<'_>,
    name: String,
    email: String,
) {
    let mut lead = LeadSubmission::new(name, email, portfolio.holdings(), LeadStep::PostOptimization);
    if let Some(score) = portfolio.internal_risk_score() {
        lead = lead.with_risk_score(score);
    }
    if let Some(optimized) = report.optimized {
        lead = lead.with_optimization(report.risk_score, optimized.risk_score, optimized.thor_allocation);
    }
    if !lead.can_submit() {
        warn!("聯絡資訊不完整，略過送出");
        return;
    }

    match LeadClient::new(&app_config.lead) {
        Ok(client) => {
            if let Err(err) = client.submit_detached(lead).await {
                warn!("潛在客戶資料送出任務異常結束: {}", err);
            }
        }
        Err(err) => warn!("無法建立潛在客戶資料客戶端: {}", err),
    }
}

fn percent(value: f64) -> String {
    format!("{:>7.2}%", value * 100.0)
}

fn print_metrics(label: &str, metrics: &PortfolioMetrics) {
    println!(
        "{:<14} 報酬 {}  波動 {}  回撤 {}  Sharpe {:>5.2}  VaR95 {}  分數 {:>3}",
        label,
        percent(metrics.annualized_return),
        percent(metrics.volatility),
        percent(metrics.max_drawdown),
        metrics.sharpe_ratio,
        percent(metrics.var95),
        metrics.score_or_zero()
    );
}

fn print_report(report: &AnalysisReport<'_>) {
    println!("持倉 (合計 {:.1}%)", report.total_allocation);
    for holding in report.holdings {
        println!("  {:<8} {:>6.1}%  {}", holding.ticker, holding.allocation, holding.name);
    }
    println!();

    println!("風險分數 {} ({})", report.risk_score, report.risk_category);
    if let (Some(score), Some(profile)) = (report.provider_risk_score, report.provider_profile) {
        println!("問卷風險分數 {} ({}，六個月可能下跌 {})", score, profile.label, profile.downside_6m);
    }
    print_metrics("目前組合", report.metrics);
    for benchmark in report.benchmarks {
        print_metrics(benchmark.name, &benchmark.metrics);
    }
    println!();

    if let Some(optimized) = report.optimized {
        println!(
            "最佳化 ({}): THOR {}% (THIR {:.1}% / THLV {:.1}%)",
            report.mode, optimized.thor_allocation, optimized.thir_pct, optimized.thlv_pct
        );
        print_metrics("混合後", &optimized.metrics);
    }
}

// 初始化日誌系統
fn init_logging(log_config: &LogConfig) -> Result<()> {
    let level = match log_config.level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO, // 默認為INFO
    };

    // RUST_LOG 優先，否則使用配置的級別；日誌寫到 stderr 以免混入報告輸出
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let result = if log_config.format.eq_ignore_ascii_case("json") {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish(),
        )
    };
    result.map_err(|e| anyhow!("設置日誌系統失敗: {}", e))?;

    info!("日誌系統初始化完成");
    Ok(())
}
