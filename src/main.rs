use haproxy_dataplane_provider::bundle::{BundleApply, ResourceBundle, StackModel};
use haproxy_dataplane_provider::dataplane::HttpDataPlaneClient;
use haproxy_dataplane_provider::logging::init_logging;
use haproxy_dataplane_provider::settings::Settings;
use haproxy_dataplane_provider::transaction::{RetryPolicy, TransactionCoordinator};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

fn usage() -> ExitCode {
    eprintln!("사용법: dataplane-apply <bundle.json>");
    ExitCode::from(2)
}

#[tokio::main]
async fn main() -> ExitCode {
    let Some(bundle_path) = std::env::args().nth(1) else {
        return usage();
    };

    // 설정 로드
    let settings = match Settings::load().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("설정 로드 실패: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // 로깅 초기화. 가드는 main이 끝날 때까지 유지한다.
    let _guard = match init_logging(&settings.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("로깅 초기화 실패: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let stack: StackModel = match tokio::fs::read_to_string(&bundle_path)
        .await
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
    {
        Ok(stack) => stack,
        Err(e) => {
            error!(path = %bundle_path, error = %e, "묶음 파일을 읽을 수 없습니다");
            return ExitCode::FAILURE;
        }
    };

    let client = match HttpDataPlaneClient::new(&settings.dataplane) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Data Plane API 클라이언트 생성 실패");
            return ExitCode::FAILURE;
        }
    };
    let coordinator = TransactionCoordinator::new(Arc::new(client), RetryPolicy::from(&settings.retry));

    // Ctrl-C는 진행 중인 요청을 버리고 재시도를 멈춘다
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("중단 신호 수신, 적용을 취소합니다");
            signal_token.cancel();
        }
    });

    let work = BundleApply {
        bundle: ResourceBundle::from(&stack),
    };
    info!(
        url = %settings.dataplane.url,
        servers = work.bundle.servers.len(),
        "리소스 묶음 적용 시작"
    );

    match coordinator.run_in_transaction(&cancel, &work).await {
        Ok(()) => {
            info!("리소스 묶음 적용 완료");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, attempts = e.attempts(), "리소스 묶음 적용 실패");
            ExitCode::FAILURE
        }
    }
}
