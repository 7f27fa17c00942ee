//! In-process evaluation of grouping pipelines.
//!
//! Backends load the records in scope and hand them here; stages run in
//! order over either records or groups.

use std::collections::HashMap;

use super::StoreError;
use crate::grouping::{Pipeline, Stage, WellForecastGroup};
use crate::model::ForecastOutput;

/// Intermediate and final pipeline values.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    Records(Vec<ForecastOutput>),
    Groups(Vec<WellForecastGroup>),
    Count(u64),
}

impl Aggregate {
    fn kind(&self) -> &'static str {
        match self {
            Self::Records(_) => "records",
            Self::Groups(_) => "groups",
            Self::Count(_) => "count",
        }
    }

    pub fn into_groups(self) -> Result<Vec<WellForecastGroup>, StoreError> {
        match self {
            Self::Groups(groups) => Ok(groups),
            other => Err(StoreError::Pipeline(format!(
                "expected groups, pipeline produced {}",
                other.kind()
            ))),
        }
    }

    pub fn into_count(self) -> Result<u64, StoreError> {
        match self {
            Self::Count(n) => Ok(n),
            other => Err(StoreError::Pipeline(format!(
                "expected a count, pipeline produced {}",
                other.kind()
            ))),
        }
    }
}

fn skip<T>(mut items: Vec<T>, n: usize) -> Vec<T> {
    items.drain(..n.min(items.len()));
    items
}

/// Group records by well, keeping the order wells first appear in.
/// Outputs inside a group are ordered by phase.
pub fn group_by_well(records: Vec<ForecastOutput>) -> Vec<WellForecastGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<WellForecastGroup> = Vec::new();

    for output in records {
        if let Some(&i) = index.get(&output.well) {
            groups[i].outputs.push(output);
        } else {
            index.insert(output.well.clone(), groups.len());
            groups.push(WellForecastGroup {
                well: output.well.clone(),
                forecast: output.forecast.clone(),
                project: output.project.clone(),
                outputs: vec![output],
            });
        }
    }

    for group in &mut groups {
        group.outputs.sort_by_key(|o| o.phase);
    }
    groups
}

/// Run every stage of `pipeline` over `records`.
pub fn execute(records: Vec<ForecastOutput>, pipeline: &Pipeline) -> Result<Aggregate, StoreError> {
    let mut state = Aggregate::Records(records);

    for stage in pipeline.stages() {
        state = match (state, stage) {
            (Aggregate::Records(mut records), Stage::Match(filter)) => {
                records.retain(|o| filter.matches(o));
                Aggregate::Records(records)
            }
            (Aggregate::Records(mut records), Stage::Sort(sort)) => {
                records.sort_by(|a, b| sort.compare(a, b));
                Aggregate::Records(records)
            }
            (Aggregate::Groups(mut groups), Stage::Sort(sort)) => {
                groups.sort_by(|a, b| sort.compare(a, b));
                Aggregate::Groups(groups)
            }
            (Aggregate::Records(records), Stage::GroupByWell) => {
                Aggregate::Groups(group_by_well(records))
            }
            (Aggregate::Records(records), Stage::Skip(n)) => Aggregate::Records(skip(records, *n)),
            (Aggregate::Groups(groups), Stage::Skip(n)) => Aggregate::Groups(skip(groups, *n)),
            (Aggregate::Records(mut records), Stage::Limit(n)) => {
                records.truncate(*n);
                Aggregate::Records(records)
            }
            (Aggregate::Groups(mut groups), Stage::Limit(n)) => {
                groups.truncate(*n);
                Aggregate::Groups(groups)
            }
            (Aggregate::Records(records), Stage::Count) => Aggregate::Count(records.len() as u64),
            (Aggregate::Groups(groups), Stage::Count) => Aggregate::Count(groups.len() as u64),
            (state, stage) => {
                return Err(StoreError::Pipeline(format!(
                    "stage {stage:?} cannot run on {}",
                    state.kind()
                )))
            }
        };
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::PipelineBuilder;
    use crate::model::{OutputType, Phase};
    use crate::query::{SortDirection, SortField, SortQuery, StoreFilter};
    use std::collections::BTreeMap;

    fn output(well: &str, phase: Phase) -> ForecastOutput {
        ForecastOutput {
            id: format!("{well}-{phase}"),
            project: "p".to_string(),
            forecast: "f".to_string(),
            well: well.to_string(),
            phase,
            forecast_type: OutputType::Rate,
            p_dict: BTreeMap::new(),
            ratio: None,
            updated_at: None,
        }
    }

    fn scope() -> StoreFilter {
        StoreFilter {
            project: "p".to_string(),
            forecast: "f".to_string(),
            ..StoreFilter::default()
        }
    }

    fn records() -> Vec<ForecastOutput> {
        vec![
            output("C", Phase::Gas),
            output("A", Phase::Water),
            output("B", Phase::Oil),
            output("A", Phase::Oil),
            output("C", Phase::Oil),
        ]
    }

    #[test]
    fn test_group_by_well_keeps_first_appearance() {
        let groups = group_by_well(records());
        let wells: Vec<_> = groups.iter().map(|g| g.well.as_str()).collect();
        assert_eq!(wells, vec!["C", "A", "B"]);
        assert_eq!(groups[1].outputs[0].phase, Phase::Oil);
        assert_eq!(groups[1].outputs[1].phase, Phase::Water);
    }

    #[test]
    fn test_sorted_paged_groups() {
        let pipeline = PipelineBuilder::new(scope())
            .sort(SortQuery::default())
            .page(1, 2)
            .build();
        let groups = execute(records(), &pipeline).unwrap().into_groups().unwrap();
        let wells: Vec<_> = groups.iter().map(|g| g.well.as_str()).collect();
        assert_eq!(wells, vec!["B", "C"]);
    }

    #[test]
    fn test_descending_sort() {
        let sort = SortQuery {
            field: SortField::Well,
            direction: SortDirection::Descending,
        };
        let pipeline = PipelineBuilder::new(scope()).sort(sort).page(0, 10).build();
        let groups = execute(records(), &pipeline).unwrap().into_groups().unwrap();
        assert_eq!(groups[0].well, "C");
        assert_eq!(groups[2].well, "A");
    }

    #[test]
    fn test_count_distinct_wells() {
        let pipeline = PipelineBuilder::new(scope()).count().build();
        assert_eq!(execute(records(), &pipeline).unwrap().into_count().unwrap(), 3);

        let other = StoreFilter {
            forecast: "other".to_string(),
            ..scope()
        };
        let pipeline = PipelineBuilder::new(other).count().build();
        assert_eq!(execute(records(), &pipeline).unwrap().into_count().unwrap(), 0);
    }

    #[test]
    fn test_count_result_is_not_groups() {
        let pipeline = PipelineBuilder::new(scope()).count().build();
        let err = execute(records(), &pipeline).unwrap().into_groups().unwrap_err();
        assert!(matches!(err, StoreError::Pipeline(_)));
    }
}
