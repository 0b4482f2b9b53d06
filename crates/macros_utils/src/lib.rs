/// Emit a `routes` registration function for an actix route module.
///
/// Each route module lists its handler services once and gets a
/// `routes(cfg)` function back, so `routes::routes` can compose modules
/// without repeating service names:
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($(route $service:ident),+ $(,)?) => {
        /// Register this module's routes.
        pub fn routes(cfg: &mut ::actix_web::web::ServiceConfig) {
            $(cfg.service($service);)+
        }
    };
}
