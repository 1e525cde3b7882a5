//! Small declarative helpers shared by the Pulse HTTP surface.

/// Generates a `pub fn routes(cfg: &mut ServiceConfig)` for a route module.
///
/// `route name` registers an actix handler declared with a routing macro
/// (`#[get(..)]`, `#[post(..)]`), `module name` delegates to `name::routes`.
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
///     module ping,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($($kind:ident $name:ident),* $(,)?) => {
        pub fn routes(cfg: &mut ::actix_web::web::ServiceConfig) {
            $( $crate::__route_entry!(cfg, $kind $name); )*
        }
    };
}

#[cfg(feature = "actix")]
#[doc(hidden)]
#[macro_export]
macro_rules! __route_entry {
    ($cfg:ident, route $name:ident) => {
        $cfg.service($name);
    };
    ($cfg:ident, module $name:ident) => {
        $name::routes($cfg);
    };
}
