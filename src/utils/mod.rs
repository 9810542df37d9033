pub mod asset_url;
pub mod http_client;
pub mod url;

pub use self::asset_url::AssetResolver;
pub use self::url::UrlUtils;

use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Lowercase base-36 random suffix used in generated file names
pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}
