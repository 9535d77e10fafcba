//! HTTP 中间件
//! 请求追踪、登录限流、客户端 IP 识别

use crate::{
    auth::{jwt::JwtService, password::PasswordHasher},
    config::AppConfig,
    error::AppError,
    repository::CredentialStore,
    services::{AuthService, CustomerService},
};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn CredentialStore>,
    pub jwt_service: Arc<JwtService>,
    pub auth_service: Arc<AuthService>,
    pub customer_service: Arc<CustomerService>,
    /// 登录/注册 IP 限流器
    pub rate_limiter: Arc<IpRateLimiter>,
}

impl AppState {
    /// 根据配置和存储后端装配所有服务
    pub fn new(config: AppConfig, store: Arc<dyn CredentialStore>) -> Result<Self, AppError> {
        let config = Arc::new(config);
        let jwt_service = Arc::new(JwtService::from_config(&config)?);
        let password_hasher = PasswordHasher::new(&config.password_hash)?;

        let auth_service = Arc::new(AuthService::new(
            store.clone(),
            jwt_service.clone(),
            password_hasher.clone(),
            config.clone(),
        ));
        let customer_service = Arc::new(CustomerService::new(
            store.clone(),
            password_hasher,
            config.clone(),
        ));
        let rate_limiter = Arc::new(IpRateLimiter::new(
            config.security.login_max_requests as usize,
            Duration::from_secs(config.security.login_window_secs as u64),
        ));

        Ok(Self {
            config,
            store,
            jwt_service,
            auth_service,
            customer_service,
            rate_limiter,
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        // 指标标签只用静态字符串
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            "PATCH" => "PATCH",
            _ => "UNKNOWN",
        };
        let status_code = match status {
            200 => "200",
            201 => "201",
            204 => "204",
            400 => "400",
            401 => "401",
            403 => "403",
            404 => "404",
            409 => "409",
            429 => "429",
            500 => "500",
            _ => "other",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_code)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            status = status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            headers.insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// 登录/注册限流中间件，按客户端 IP 的滑动窗口计数
pub async fn login_rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client_ip = client_ip(&req, state.config.security.trust_proxy);

    if !state.rate_limiter.check(client_ip) {
        tracing::warn!(
            client_ip = %client_ip,
            path = %req.uri().path(),
            "Login rate limit exceeded"
        );
        metrics::counter!("auth_login_total", "outcome" => "rate_limited").increment(1);
        return Err(AppError::RateLimitExceeded);
    }

    Ok(next.run(req).await)
}

/// 获取客户端 IP
/// 只有 trust_proxy 打开时才读取代理头，否则使用连接地址
pub fn client_ip(req: &Request, trust_proxy: bool) -> IpAddr {
    if trust_proxy {
        if let Some(ip) = forwarded_ip(req.headers()) {
            return ip;
        }
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip();
    }

    // 没有连接信息（例如测试中直接调用 Router）
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    // X-Forwarded-For 可能包含多个 IP，取第一个
    let from_forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());

    from_forwarded_for.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    })
}

// ==================== 限流服务 ====================

/// IP 级别的速率限制器
/// 使用滑动窗口算法实现
pub struct IpRateLimiter {
    /// 每个 IP 地址的请求时间戳
    windows: DashMap<IpAddr, VecDeque<Instant>>,
    max_requests: usize,
    window: Duration,
}

impl IpRateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
        }
    }

    /// 检查并记录一次请求
    pub fn check(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now())
    }

    pub fn check_at(&self, ip: IpAddr, now: Instant) -> bool {
        // entry 持有分片写锁，检查与记录是原子的
        let mut requests = self.windows.entry(ip).or_default();

        while let Some(&front) = requests.front() {
            if now.saturating_duration_since(front) < self.window {
                break;
            }
            requests.pop_front();
        }

        if requests.len() < self.max_requests {
            requests.push_back(now);
            true
        } else {
            false
        }
    }

    /// 清理窗口内已无请求的 IP
    pub fn prune(&self) {
        let now = Instant::now();
        self.windows.retain(|_, requests| {
            requests
                .back()
                .is_some_and(|&last| now.saturating_duration_since(last) < self.window)
        });
    }

    pub fn tracked_ips(&self) -> usize {
        self.windows.len()
    }
}
