//! Well forecast data grouping.
//!
//! Describes the store pipeline that groups forecast outputs by well, and
//! runs it with `take + 1` as the limit so one extra group signals that
//! another page exists.

use serde::Serialize;
use tracing::debug;

use crate::model::ForecastOutput;
use crate::query::{SortField, SortKeys, SortQuery, StoreFilter};
use crate::store::{ForecastStore, StoreError};

/// All outputs of one well within one forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct WellForecastGroup {
    pub well: String,
    pub forecast: String,
    pub project: String,
    pub outputs: Vec<ForecastOutput>,
}

impl SortKeys for WellForecastGroup {
    fn well_key(&self) -> &str {
        &self.well
    }

    fn forecast_key(&self) -> &str {
        &self.forecast
    }
}

/// One declarative pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Match(StoreFilter),
    Sort(SortQuery),
    GroupByWell,
    Skip(usize),
    Limit(usize),
    Count,
}

/// Stage ordering around the group stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOrdering {
    /// match → group → sort. Used for `forecast` sorts: every record of a
    /// scoped query shares the forecast, so sorting records first buys nothing.
    GroupThenSort,
    /// match → sort → group → sort. Records reach the group stage in key
    /// order; grouping does not keep order, hence the second sort.
    SortGroupSort,
}

impl PipelineOrdering {
    pub fn for_sort(sort: &SortQuery) -> Self {
        match sort.field {
            SortField::Forecast => Self::GroupThenSort,
            SortField::Well => Self::SortGroupSort,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// The leading match filter, which scopes the pipeline to one forecast.
    pub fn scope(&self) -> Option<&StoreFilter> {
        match self.stages.first() {
            Some(Stage::Match(filter)) => Some(filter),
            _ => None,
        }
    }
}

pub struct PipelineBuilder {
    filter: StoreFilter,
    sort: Option<SortQuery>,
    skip: usize,
    limit: Option<usize>,
    count: bool,
}

impl PipelineBuilder {
    pub fn new(filter: StoreFilter) -> Self {
        Self {
            filter,
            sort: None,
            skip: 0,
            limit: None,
            count: false,
        }
    }

    #[must_use]
    pub fn sort(mut self, sort: SortQuery) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn page(mut self, skip: usize, limit: usize) -> Self {
        self.skip = skip;
        self.limit = Some(limit);
        self
    }

    /// Count groups instead of returning them. Sort and paging are dropped.
    #[must_use]
    pub fn count(mut self) -> Self {
        self.count = true;
        self
    }

    pub fn build(self) -> Pipeline {
        let mut stages = vec![Stage::Match(self.filter)];

        if self.count {
            stages.push(Stage::GroupByWell);
            stages.push(Stage::Count);
            return Pipeline { stages };
        }

        match self.sort {
            Some(sort) => match PipelineOrdering::for_sort(&sort) {
                PipelineOrdering::GroupThenSort => {
                    stages.push(Stage::GroupByWell);
                    stages.push(Stage::Sort(sort));
                }
                PipelineOrdering::SortGroupSort => {
                    stages.push(Stage::Sort(sort));
                    stages.push(Stage::GroupByWell);
                    stages.push(Stage::Sort(sort));
                }
            },
            None => stages.push(Stage::GroupByWell),
        }

        if self.skip > 0 {
            stages.push(Stage::Skip(self.skip));
        }
        if let Some(limit) = self.limit {
            stages.push(Stage::Limit(limit));
        }
        Pipeline { stages }
    }
}

/// One page of groups.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPage {
    pub groups: Vec<WellForecastGroup>,
    pub has_next: bool,
}

/// Fetch the `[skip, skip + take)` groups under `sort`.
pub async fn fetch_well_groups(
    store: &dyn ForecastStore,
    filter: StoreFilter,
    sort: SortQuery,
    skip: usize,
    take: usize,
) -> Result<GroupPage, StoreError> {
    let pipeline = PipelineBuilder::new(filter)
        .sort(sort)
        .page(skip, take.saturating_add(1))
        .build();
    debug!(
        backend = store.backend_name(),
        ordering = ?PipelineOrdering::for_sort(&sort),
        stages = pipeline.stages().len(),
        "Running well grouping pipeline"
    );

    let mut groups = store.aggregate_groups(&pipeline).await?;
    let has_next = groups.len() > take;
    groups.truncate(take);
    Ok(GroupPage { groups, has_next })
}

/// Number of distinct wells matching `filter`.
pub async fn count_wells(store: &dyn ForecastStore, filter: StoreFilter) -> Result<u64, StoreError> {
    let pipeline = PipelineBuilder::new(filter).count().build();
    store.aggregate_count(&pipeline).await
}
