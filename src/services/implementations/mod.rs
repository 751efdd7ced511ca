mod flusher_service;
mod sampler_service;
#[cfg(feature = "web")]
mod webserver_service;

pub use flusher_service::FlusherService;
pub use sampler_service::SamplerService;
#[cfg(feature = "web")]
pub use webserver_service::WebserverService;
