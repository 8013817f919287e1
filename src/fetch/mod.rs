mod fetcher;

pub use fetcher::DigestFetcher;
