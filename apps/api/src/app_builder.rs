//! # アプリケーション構築
//!
//! DI（ユースケース・State）の初期化とルーター構築を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中し、ルーターテストは
//! インメモリ実装を渡してここから同じルーターを組み立てる。

use std::sync::Arc;

use axum::{
    Router,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use roomiez_domain::clock::Clock;
use roomiez_infra::{
    NotificationSender,
    TokenVerifier,
    repository::{
        ChoreRepository,
        ExpenseRepository,
        GroceryRepository,
        HouseRepository,
        ReservationRepository,
        UserRepository,
    },
};
use roomiez_shared::observability::{MakeRequestUuidV7, make_request_span};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    handler::{
        CalendarState,
        ChoreState,
        ExpenseState,
        GroceryState,
        HouseState,
        NudgeState,
        UserState,
        add_chore,
        add_grocery,
        create_expense,
        create_house,
        create_reservation,
        delete_all_groceries,
        delete_chore,
        delete_grocery,
        delete_reservation,
        get_balance,
        get_house_balances,
        get_my_house,
        get_profile,
        get_user_by_email,
        health_check,
        join_house,
        list_expenses,
        list_house_chores,
        list_house_groceries,
        list_house_reservations,
        protected,
        root,
        send_nudge,
        settle_expense,
        update_balance,
        update_chore_status,
        update_profile,
    },
    middleware::{AuthState, require_auth},
    usecase::{
        ChoreUseCaseImpl,
        ExpenseUseCaseImpl,
        GroceryUseCaseImpl,
        HouseUseCaseImpl,
        NudgeUseCaseImpl,
        ReservationUseCaseImpl,
        UserUseCaseImpl,
    },
};

/// ルーター構築に必要な外部依存
#[derive(Clone)]
pub struct AppDependencies {
    pub user_repository:        Arc<dyn UserRepository>,
    pub house_repository:       Arc<dyn HouseRepository>,
    pub chore_repository:       Arc<dyn ChoreRepository>,
    pub grocery_repository:     Arc<dyn GroceryRepository>,
    pub expense_repository:     Arc<dyn ExpenseRepository>,
    pub reservation_repository: Arc<dyn ReservationRepository>,
    pub token_verifier:         Arc<dyn TokenVerifier>,
    pub notification_sender:    Arc<dyn NotificationSender>,
    pub clock:                  Arc<dyn Clock>,
}

/// DI コンテナの構築とルーター定義を行う
///
/// ユースケース → State → Router の順に組み立てる。
/// `/` と `/health` 以外のルートはすべて認証ミドルウェアを通る。
pub fn build_app(cors_allowed_origins: &[String], deps: AppDependencies) -> Router {
    let house_state = Arc::new(HouseState {
        usecase: HouseUseCaseImpl::new(
            deps.user_repository.clone(),
            deps.house_repository.clone(),
            deps.chore_repository.clone(),
            deps.clock.clone(),
        ),
    });
    let chore_state = Arc::new(ChoreState {
        usecase: ChoreUseCaseImpl::new(
            deps.user_repository.clone(),
            deps.chore_repository.clone(),
            deps.clock.clone(),
        ),
    });
    let user_state = Arc::new(UserState {
        usecase: UserUseCaseImpl::new(deps.user_repository.clone(), deps.clock.clone()),
    });
    let nudge_state = Arc::new(NudgeState {
        usecase: NudgeUseCaseImpl::new(deps.notification_sender.clone()),
    });
    let grocery_state = Arc::new(GroceryState {
        usecase: GroceryUseCaseImpl::new(
            deps.user_repository.clone(),
            deps.grocery_repository.clone(),
            deps.clock.clone(),
        ),
    });
    let expense_state = Arc::new(ExpenseState {
        usecase: ExpenseUseCaseImpl::new(
            deps.user_repository.clone(),
            deps.house_repository.clone(),
            deps.expense_repository.clone(),
            deps.clock.clone(),
        ),
    });
    let calendar_state = Arc::new(CalendarState {
        usecase: ReservationUseCaseImpl::new(
            deps.user_repository.clone(),
            deps.reservation_repository.clone(),
            deps.clock.clone(),
        ),
    });

    let auth_state = AuthState {
        verifier: deps.token_verifier.clone(),
    };

    // 認証が必要なルート
    let protected_routes = Router::new()
        .route("/protected", get(protected))
        // ハウス API
        .merge(
            Router::new()
                .route("/house/create", post(create_house))
                .route("/house/join", post(join_house))
                .route("/house/my-house", get(get_my_house))
                .with_state(house_state),
        )
        // 家事 API
        .merge(
            Router::new()
                .route("/chores/my-house", get(list_house_chores))
                .route("/chores/add", post(add_chore))
                .route("/chores/{chore_id}/status", put(update_chore_status))
                .route("/chores/delete/{chore_id}", delete(delete_chore))
                .with_state(chore_state),
        )
        // ユーザー API
        .merge(
            Router::new()
                .route("/user/balance", get(get_balance))
                .route("/user/update-balance", post(update_balance))
                .route("/user/info/{email}", get(get_user_by_email))
                .route("/user/profile", get(get_profile).put(update_profile))
                .with_state(user_state),
        )
        // ナッジ API
        .merge(
            Router::new()
                .route("/nudge/send", post(send_nudge))
                .with_state(nudge_state),
        )
        // 買い物リスト API
        // 静的パスの all-groceries は {grocery_id} より優先してマッチする
        .merge(
            Router::new()
                .route("/grocery/add", post(add_grocery))
                .route("/grocery/my-house", get(list_house_groceries))
                .route("/grocery/all-groceries", delete(delete_all_groceries))
                .route("/grocery/{grocery_id}", delete(delete_grocery))
                .with_state(grocery_state),
        )
        // 立替 API
        .merge(
            Router::new()
                .route("/expense/create", post(create_expense))
                .route("/expense/list", get(list_expenses))
                .route("/expense/balances", get(get_house_balances))
                .route("/expense/settle", post(settle_expense))
                .with_state(expense_state),
        )
        // 予約 API
        // 静的パスの my-house は {reservation_id} より優先してマッチする
        .merge(
            Router::new()
                .route("/calendar/my-house", get(list_house_reservations))
                .route("/calendar/create", post(create_reservation))
                .route("/calendar/{reservation_id}", delete(delete_reservation))
                .with_state(calendar_state),
        )
        .route_layer(from_fn_with_state(auth_state, require_auth));

    // Request ID + TraceLayer により、すべての HTTP リクエストに request_id が付与されログに自動注入される
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(cors_layer(cors_allowed_origins))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}

/// 許可オリジンを列挙した CORS レイヤー
///
/// 認証ヘッダー付きのリクエストを受けるため、メソッドとヘッダーはプリフライトの
/// 要求をそのまま許可し、credentials を有効にする。
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "不正な CORS オリジンを無視します");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
