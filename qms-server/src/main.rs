//! QMS服务器主程序

use clap::Parser;
use qms_admin::ConfigManager;
use qms_audio::{Announcer, ClipLibrary, TracingSink};
use qms_database::{DatabasePool, DatabaseQueries, PgQueueStore};
use qms_queue::QueueEngine;
use qms_realtime::display::{run_display_loop, subscribe_display};
use qms_realtime::{DisplayConsumer, RealtimeHub};
use qms_web::{AppState, AuthService, WebServer};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// QMS服务器命令行参数
#[derive(Parser, Debug)]
#[command(name = "qms-server")]
#[command(about = "诊所排队叫号系统服务器")]
struct Args {
    /// 服务器端口（覆盖配置文件）
    #[arg(short, long)]
    port: Option<u16>,

    /// 监听主机（覆盖配置文件）
    #[arg(long)]
    host: Option<String>,

    /// 数据库连接字符串（覆盖配置文件）
    #[arg(short, long)]
    database_url: Option<String>,

    /// 配置文件路径
    #[arg(short, long, default_value = "config/qms")]
    config: String,

    /// 日志级别
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// 在服务进程内跑指定诊所的显示端消费循环（调试用）
    #[arg(long)]
    display_clinic: Option<Uuid>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(&args.log_level)
        .init();

    info!("启动QMS服务器...");

    // 加载配置
    let manager = ConfigManager::new(&args.config)?;
    let mut config = manager.get_config().await;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(url) = args.database_url {
        config.database.connection_string = url;
    }

    info!("QMS服务器配置:");
    info!("  服务器名称: {}", config.server.name);
    info!("  监听地址: {}:{}", config.server.host, config.server.port);
    info!("  音频片段目录: {}", config.audio.clips_path);

    // 连接数据库
    let db = DatabasePool::connect(
        &config.database.connection_string,
        config.database.max_connections,
    )
    .await?;

    if config.database.auto_migrate {
        DatabaseQueries::new(&db).create_tables().await?;
    }
    seed_defaults(&db).await?;

    // 队列引擎与实时分发
    let hub = RealtimeHub::new();
    let store = Arc::new(PgQueueStore::new(db.pool().clone()));
    let engine = Arc::new(QueueEngine::new(store, hub.clone()));

    // 会话签发
    let session_ttl = chrono::Duration::from_std(config.web.session_timeout)?;
    let auth = Arc::new(AuthService::new(
        config.web.session_secret.clone(),
        session_ttl,
    ));

    let state = AppState::new(db.clone(), engine, auth);

    // 调试模式：进程内显示端，播报只写日志
    if let Some(clinic_id) = args.display_clinic {
        let clinic = DatabaseQueries::new(&db).get_clinic_by_id(&clinic_id).await?;
        let announcer = Arc::new(Announcer::new(Arc::new(TracingSink)));
        let consumer = DisplayConsumer::new(
            clinic,
            announcer,
            ClipLibrary::new(&config.audio.clips_path)
                .with_emergency_repeats(config.audio.emergency_repeats),
            config.audio.alert_duration.as_secs() as i64,
        );
        let stream = subscribe_display(&hub, clinic_id);
        tokio::spawn(run_display_loop(stream, consumer));
        info!("Local display loop started for clinic {}", clinic_id);
    }

    // 启动Web服务器
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let server = WebServer::new(addr, state);
    server.run().await?;

    Ok(())
}

/// 首次启动时补齐中心记录和管理员账号
async fn seed_defaults(db: &DatabasePool) -> anyhow::Result<()> {
    let queries = DatabaseQueries::new(db);

    let center_id = match queries.get_center().await? {
        Some(center) => center.id,
        None => {
            let id = queries
                .create_center(Uuid::new_v4(), "مركز الرعاية الصحية الأولية")
                .await?;
            info!("Seeded default center record");
            id
        }
    };

    if queries.get_admin_by_email("admin@qms.local").await?.is_none() {
        let user = qms_database::NewAdminUser {
            id: Uuid::new_v4(),
            center_id,
            email: "admin@qms.local".to_string(),
            password_hash: AuthService::hash_password("Admin123"),
            full_name: "مدير النظام".to_string(),
            role: qms_core::AdminRole::SuperAdmin,
        };
        queries.create_admin_user(&user).await?;
        warn!("Seeded default admin account admin@qms.local, change its password");
    }

    Ok(())
}
