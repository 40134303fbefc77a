use super::{template, MongoDbBackend};
use crate::ast::{AggregationSpec, CorrelationKind};
use crate::error::{Result, SigmaError};

impl MongoDbBackend {
    /// Compiles a correlation into its aggregation stages:
    /// `[search, typing, aggregate, condition]` for temporal correlations,
    /// `[search, aggregate, condition]` otherwise.
    pub fn compile(&self, spec: &AggregationSpec) -> Result<Vec<String>> {
        if spec.rules.is_empty() {
            return Err(SigmaError::InvalidCorrelation(
                "correlation without rules".to_string(),
            ));
        }

        let mut stages = vec![self.search_stage(spec)];
        if spec.kind == CorrelationKind::Temporal {
            stages.push(self.typing_stage(spec));
        }
        stages.push(self.aggregate_stage(spec));
        stages.push(self.condition_stage(spec));
        Ok(stages)
    }

    /// Joins compiled stages into the pipeline literal.
    pub fn pipeline(&self, stages: &[String]) -> String {
        template::pipeline(stages)
    }

    fn search_stage(&self, spec: &AggregationSpec) -> String {
        match spec.rules.as_slice() {
            [single] => single.query.clone(),
            rules => {
                let queries = rules.iter().map(|r| r.query.clone()).collect::<Vec<_>>();
                template::multi_rule_search(&queries)
            }
        }
    }

    fn typing_stage(&self, spec: &AggregationSpec) -> String {
        let branches = spec
            .rules
            .iter()
            .map(|rule| template::typing_branch(&rule.query, &rule.id))
            .collect::<Vec<_>>();
        template::typing(&branches)
    }

    fn aggregate_stage(&self, spec: &AggregationSpec) -> String {
        let measure = match &spec.kind {
            CorrelationKind::EventCount => format!("\"{}\": {{ \"$sum\": 1 }}", measure_name(spec)),
            CorrelationKind::ValueCount(field) => format!(
                "\"{}\": {{ \"$addToSet\": \"${}\" }}",
                measure_name(spec),
                field
            ),
            CorrelationKind::Temporal => format!(
                "\"{}\": {{ \"$addToSet\": \"$event_type\" }}",
                measure_name(spec)
            ),
        };
        template::group_stage(
            self.dialect.timespan_unit(spec.timespan.unit),
            &measure,
            &template::groupby(spec.group_by.as_deref()),
        )
    }

    fn condition_stage(&self, spec: &AggregationSpec) -> String {
        template::match_stage(
            measure_name(spec),
            self.dialect.compare_token(spec.threshold.op),
            spec.threshold.count,
        )
    }
}

fn measure_name(spec: &AggregationSpec) -> &'static str {
    match spec.kind {
        CorrelationKind::EventCount => "event_count",
        CorrelationKind::ValueCount(_) => "value_count",
        CorrelationKind::Temporal => "event_type_count",
    }
}
