use tokio_rusqlite::Connection;

use crate::config::Config;
use crate::db::{append_records, SqliteTable};
use crate::error::Result;
use crate::fetch::DigestFetcher;
use crate::models::Region;
use crate::normalize::normalize;

/// Outcome of one region's fetch → normalize → append pipeline.
#[derive(Debug, Clone, Copy)]
pub struct RegionRun {
    pub region: Region,
    pub fetched: usize,
    pub written: usize,
    pub duplicates: usize,
}

impl RegionRun {
    fn empty(region: Region) -> Self {
        Self {
            region,
            fetched: 0,
            written: 0,
            duplicates: 0,
        }
    }
}

pub struct Collector {
    config: Config,
    fetcher: DigestFetcher,
    conn: Connection,
}

impl Collector {
    pub async fn new(config: &Config, api_key: String) -> Result<Self> {
        let conn = Connection::open(&config.db_path).await?;
        Ok(Self {
            config: config.clone(),
            fetcher: DigestFetcher::new(config, api_key),
            conn,
        })
    }

    /// Run all three regions sequentially. A failure in one region is
    /// logged and never aborts the others.
    pub async fn run_all(&self) -> Vec<RegionRun> {
        let mut runs = Vec::with_capacity(Region::ALL.len());
        for region in Region::ALL {
            let run = match self.run_region(region).await {
                Ok(run) => run,
                Err(e) => {
                    tracing::error!(region = %region, error = %e, "region run failed");
                    RegionRun::empty(region)
                }
            };
            runs.push(run);
        }
        runs
    }

    async fn run_region(&self, region: Region) -> Result<RegionRun> {
        let raw_items = self.fetcher.fetch(region).await;
        if raw_items.is_empty() {
            tracing::info!(region = %region, "no news items returned");
            return Ok(RegionRun::empty(region));
        }

        let fetched = raw_items.len();
        let records = normalize(raw_items, region);
        if records.is_empty() {
            tracing::info!(region = %region, fetched, "all fetched items were empty");
            return Ok(RegionRun {
                region,
                fetched,
                written: 0,
                duplicates: 0,
            });
        }

        let table_name = region.table_name(&self.config.region_tables);
        let table = SqliteTable::new(self.conn.clone(), table_name)?;
        let written = append_records(&table, &records).await?;
        let duplicates = records.len() - written;

        tracing::info!(
            region = %region,
            table = table_name,
            fetched,
            written,
            duplicates,
            "region run complete"
        );

        Ok(RegionRun {
            region,
            fetched,
            written,
            duplicates,
        })
    }
}
