pub mod errors;
pub mod freebies;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod scrape;
pub mod store;

pub mod util {
    pub mod env;
}
