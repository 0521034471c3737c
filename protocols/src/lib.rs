//! Wire codecs used by the probe strategies.

pub mod dns;
