//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the engine APIs instead, which do their
//! I/O asynchronously, so a worker keeps serving other requests while one waits on the database.
//!
//! Handlers that act on behalf of a user take an [`AuthenticatedUser`] argument. Those requests are rejected with a
//! 401 before the handler runs unless they carry a valid session cookie.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use loyalty_engine::{
    traits::{BalanceManagement, OrderManagement, UserManagement},
    AuthApi,
    AuthApiError,
    LedgerApi,
    OrderFlowApi,
    SubmitOrderResult,
};

use crate::{
    auth::{AuthenticatedUser, CookieSigner},
    config::ServerOptions,
    data_objects::{
        BalanceResponse,
        Credentials,
        JsonResponse,
        OrderResponse,
        WithdrawalRequest,
        WithdrawalResponse,
    },
    errors::ServerError,
    helpers::get_remote_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Malformed JSON bodies get the same `{"error": ...}` treatment as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Could not deserialize request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(register => Post "/register" impl UserManagement);
/// Route handler for the register endpoint
///
/// Creates an account from the `{login, password}` body, and logs the new user in straight away by setting the
/// session cookie.
pub async fn register<A: UserManagement>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<A>>,
    signer: web::Data<CookieSigner>,
) -> Result<HttpResponse, ServerError> {
    let Credentials { login, password } = body.into_inner();
    debug!("💻️ POST register for {login}");
    let user = api.register(&login, &password).await?;
    Ok(HttpResponse::Ok().cookie(signer.cookie(user.id)).json(JsonResponse::success("Registered")))
}

route!(login => Post "/login" impl UserManagement);
/// Route handler for the login endpoint
///
/// Sets the session cookie if the `{login, password}` body matches an account.
pub async fn login<A: UserManagement>(
    req: HttpRequest,
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<A>>,
    signer: web::Data<CookieSigner>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let Credentials { login, password } = body.into_inner();
    debug!("💻️ POST login for {login}");
    match api.authenticate(&login, &password).await {
        Ok(user) => Ok(HttpResponse::Ok().cookie(signer.cookie(user.id)).json(JsonResponse::success("Logged in"))),
        Err(AuthApiError::InvalidCredentials) => {
            let remote = get_remote_ip(&req, options.use_x_forwarded_for);
            info!("💻️ Failed login attempt for {login} from {remote:?}");
            Err(AuthApiError::InvalidCredentials.into())
        },
        Err(e) => Err(e.into()),
    }
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(submit_order => Post "/orders" impl OrderManagement);
/// Route handler for order submission
///
/// The body is the bare order number as plain text. A new order is answered with 202 Accepted: it will be settled in
/// the background. Re-submitting one of your own orders is harmless and answered with 200 OK.
pub async fn submit_order<B: OrderManagement>(
    user: AuthenticatedUser,
    body: String,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let number = body.trim();
    debug!("💻️ POST order [{number}] for user #{}", user.user_id);
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(ServerError::InvalidRequestBody("The request body must be an order number".to_string()));
    }
    match api.submit_order(user.user_id, number).await? {
        SubmitOrderResult::Accepted(order) => Ok(HttpResponse::Accepted().json(OrderResponse::from(order))),
        SubmitOrderResult::AlreadySubmitted(order) => Ok(HttpResponse::Ok().json(OrderResponse::from(order))),
    }
}

route!(my_orders => Get "/orders" impl OrderManagement);
/// Route handler for the orders endpoint
///
/// Lists the user's orders, newest first, or answers 204 No Content if there are none.
pub async fn my_orders<B: OrderManagement>(
    user: AuthenticatedUser,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for user #{}", user.user_id);
    let orders = api.orders_for_user(user.user_id).await?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let orders = orders.into_iter().map(OrderResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Balance  ----------------------------------------------------
route!(my_balance => Get "/balance" impl BalanceManagement);
pub async fn my_balance<B: BalanceManagement>(
    user: AuthenticatedUser,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET balance for user #{}", user.user_id);
    let balance = api.read(user.user_id).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse::from(balance)))
}

route!(withdraw => Post "/balance/withdraw" impl BalanceManagement);
/// Route handler for withdrawals
///
/// Spends `sum` points against the order number `order`. Fails with 402 Payment Required if the balance does not
/// cover it, and with 422 if the order number or the amount is invalid. Nothing changes when a withdrawal fails.
pub async fn withdraw<B: BalanceManagement>(
    user: AuthenticatedUser,
    body: web::Json<WithdrawalRequest>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let WithdrawalRequest { order, sum } = body.into_inner();
    debug!("💻️ POST withdraw {sum} against [{order}] for user #{}", user.user_id);
    let withdrawal = api.debit(user.user_id, &order, sum).await?;
    Ok(HttpResponse::Ok().json(WithdrawalResponse::from(withdrawal)))
}

route!(my_withdrawals => Get "/withdrawals" impl BalanceManagement);
pub async fn my_withdrawals<B: BalanceManagement>(
    user: AuthenticatedUser,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET withdrawals for user #{}", user.user_id);
    let withdrawals = api.withdrawals(user.user_id).await?;
    if withdrawals.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let withdrawals = withdrawals.into_iter().map(WithdrawalResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(withdrawals))
}
