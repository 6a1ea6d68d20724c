use actix_cors::Cors;
use actix_web::middleware::{Compress, DefaultHeaders};
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use human_panic::setup_panic;
use std::sync::Arc;
use tracing::{debug, error, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

// 从 lib.rs 导入模块
use rust_learnhub::config::{AppConfig, CorsConfig, LOG_FILE_PREFIX};
use rust_learnhub::routes;
use rust_learnhub::runtime::lifetime;
use rust_learnhub::utils::{json_error_handler, path_error_handler, query_error_handler};

fn build_cors(cors: &CorsConfig) -> Cors {
    let base = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(cors.max_age);
    if cors.allowed_origins.iter().any(|o| o == "*") {
        return base.allow_any_origin();
    }
    // 刷新令牌放在 Cookie 中，指定来源时允许携带凭证
    cors.allowed_origins
        .iter()
        .fold(base.supports_credentials(), |cors, origin| {
            cors.allowed_origin(origin)
        })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    // 记录程序启动时间
    let app_start_time = chrono::Utc::now();

    // 启动前预处理 //

    // 初始化配置
    setup_panic!();
    let mut config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // 初始化日志：标准输出，另可按天滚动写入 JSON 日志文件供后台查看
    let (stdout_writer, _stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let stdout_layer = if config.is_development() {
        fmt::layer()
            .with_writer(stdout_writer)
            .with_ansi(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer().json().with_writer(stdout_writer).boxed()
    };

    let (file_layer, _file_guard) = if config.app.log_dir.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&config.app.log_dir, LOG_FILE_PREFIX);
        let (file_writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(file_writer);
        (Some(layer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.app.log_level))
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if let Err(e) = config.resolve_jwt_secret() {
        error!("Invalid JWT configuration: {}", e);
        std::process::exit(1);
    }

    // 打印信息
    warn!(
        "Starting pre-startup processing...
        Project: {}
        Version: {}
        Authors: {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_AUTHORS")
    );

    let startup = lifetime::startup::prepare_server_startup(&config).await;

    let storage = startup.storage.clone();
    let cache = startup.cache.clone();
    let config = Arc::new(config);

    // 输出预处理时间
    debug!(
        "Pre-startup processing completed in {} ms",
        chrono::Utc::now()
            .signed_duration_since(app_start_time)
            .num_milliseconds()
    );

    // 预处理完成 //

    warn!("Using {} CPU cores for the server", config.server.workers);

    let app_config = config.clone();
    // Start the HTTP server
    let server = HttpServer::new(move || {
        let config = app_config.clone();
        App::new()
            .wrap(build_cors(&config.cors))
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Connection", "keep-alive"))
                    .add((
                        "Keep-Alive",
                        format!("timeout={}, max=1000", config.server.timeouts.keep_alive),
                    ))
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .app_data(web::QueryConfig::default().error_handler(query_error_handler)) // 设置查询参数错误处理器
            .app_data(web::JsonConfig::default().error_handler(json_error_handler)) // 设置JSON错误处理器
            .app_data(web::PathConfig::default().error_handler(path_error_handler)) // 设置路径参数错误处理器
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::PayloadConfig::new(
                config.server.limits.max_payload_size,
            )) // 设置最大请求体大小
            .app_data(web::Data::new(config.clone()))
            .configure(routes::configure_auth_routes) // 认证
            .configure(routes::configure_user_routes) // 个人资料与设置
            .configure(routes::configure_admin_routes) // 后台管理
            .configure(routes::configure_course_routes) // 课程，含课程下的章节列表与创建
            .configure(routes::configure_chapter_routes) // 章节与章节资源
            .configure(routes::configure_enrollment_routes) // 选课
            .configure(routes::configure_study_routes) // 学习进度
            .configure(routes::configure_assignment_routes) // 作业与提交
            .configure(routes::configure_file_routes) // 文件访问与上传文件服务
    })
    .keep_alive(std::time::Duration::from_secs(
        config.server.timeouts.keep_alive,
    )) // 启用长连接
    .client_request_timeout(std::time::Duration::from_millis(
        config.server.timeouts.client_request,
    )) // 客户端超时
    .client_disconnect_timeout(std::time::Duration::from_millis(
        config.server.timeouts.client_disconnect,
    )) // 断连超时
    .workers(config.server.workers);

    let server = {
        #[cfg(unix)]
        {
            if let Some(socket_path) = config.unix_socket_path() {
                warn!("Starting server on Unix socket: {}", socket_path);
                if std::path::Path::new(socket_path).exists() {
                    std::fs::remove_file(socket_path)?;
                }
                server.bind_uds(socket_path)?
            } else {
                let bind_address = config.server_bind_address();
                warn!("Starting server at http://{}", bind_address);
                server.bind(bind_address)?
            }
        }

        #[cfg(not(unix))]
        {
            let bind_address = config.server_bind_address();
            warn!("Starting server at http://{}", bind_address);
            server.bind(bind_address)?
        }
    }
    .run();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown() => {
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    Ok(())
}
