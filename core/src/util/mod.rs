mod ring;

pub use ring::ByteRing;
