//! Cross-validation driver.
//!
//! [`CrossValidation`] runs one of three protocols over a [`Problem`] with a
//! [`Classifier`] backend and returns a [`PerformanceReport`]:
//!
//! - [`train_evaluate`](CrossValidation::train_evaluate): train on all
//!   instances and score the same instances (optimistic).
//! - [`leave_one_out`](CrossValidation::leave_one_out): hold out each
//!   instance in turn.
//! - [`k_fold`](CrossValidation::k_fold): repeated stratified k-fold.
//!
//! With [`Scaling`] enabled, a fresh scaler is fitted on the training
//! instances of every split and applied to both sides of it.
//!
//! Classifier failures abort the run; statistics-service failures only leave
//! the affected samples out of the report.

use foldwise_core::{FoldwiseError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::auc::AucEvaluator;
use crate::config::{CvConfig, CvMode};
use crate::contingency::ContingencyTable;
use crate::folds::FoldAssigner;
use crate::labels::distinct_classes;
use crate::measure::{EvaluationMeasure, NativeMeasure};
use crate::problem::{Classifier, Problem};
use crate::report::{FoldOutcome, PerformanceReport, TabularReport, AUC_MEASURE, F1_MEASURE};
use crate::scaling::{FeatureScaler, Scaling};

/// Evaluation driver owning a classifier backend and its problem.
pub struct CrossValidation<C: Classifier> {
    classifier: C,
    problem: C::Problem,
    evaluator: AucEvaluator,
    measures: Vec<String>,
    assigner: FoldAssigner,
    scaling: Scaling,
    model: Option<C::Model>,
}

impl<C: Classifier> CrossValidation<C> {
    pub fn new(classifier: C, problem: C::Problem, evaluator: AucEvaluator) -> Self {
        Self {
            classifier,
            problem,
            evaluator,
            measures: Vec::new(),
            assigner: FoldAssigner::default(),
            scaling: Scaling::None,
            model: None,
        }
    }

    /// Extra measures evaluated per fold, e.g. `["auc", "mat"]`.
    pub fn with_measures<I, S>(mut self, measures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.measures = measures.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_assigner(mut self, assigner: FoldAssigner) -> Self {
        self.assigner = assigner;
        self
    }

    pub fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn problem(&self) -> &C::Problem {
        &self.problem
    }

    pub fn measures(&self) -> &[String] {
        &self.measures
    }

    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    /// Train on every instance and keep the model.
    pub fn train_model(&mut self) -> Result<&C::Model> {
        let model = self.classifier.train(&self.problem)?;
        Ok(self.model.insert(model))
    }

    /// Replace the kept model, e.g. with one trained elsewhere.
    pub fn set_model(&mut self, model: C::Model) {
        self.model = Some(model);
    }

    /// The model kept by [`train_model`](Self::train_model) or
    /// [`train_evaluate`](Self::train_evaluate), if any.
    pub fn model(&self) -> Option<&C::Model> {
        self.model.as_ref()
    }

    /// Train on all instances and evaluate on the same instances.
    ///
    /// The trained model is kept; with scaling enabled it was trained on the
    /// scaled instances. The report holds one table over all instances, one
    /// `AUC` sample and one sample per requested measure.
    ///
    /// # Errors
    ///
    /// Returns an error if the problem is empty or holds a single class, or
    /// if training/prediction fails.
    pub fn train_evaluate(&mut self) -> Result<PerformanceReport> {
        let n = self.problem.len();
        if n == 0 {
            return Err(FoldwiseError::InvalidInput("empty problem".into()));
        }
        let labels = self.problem.labels();
        require_two_classes(&labels)?;

        let scaled = self
            .fit_scaler(&self.problem)
            .map(|scaler| self.problem.scale_features(scaler.as_ref()));
        let problem = scaled.as_ref().unwrap_or(&self.problem);
        let model = self.classifier.train(problem)?;

        let mut decisions = Vec::with_capacity(n);
        let mut table = ContingencyTable::new();
        for (i, &label) in labels.iter().enumerate() {
            let decision = self.classifier.predict(&model, problem, i)?;
            table.observe_decision(label, decision);
            decisions.push(decision);
        }
        self.model = Some(model);

        let mut store = EvaluationMeasure::new();
        record_auc_family(
            &self.evaluator,
            &self.measures,
            &decisions,
            &labels,
            &table,
            &mut store,
        )?;
        let report = PerformanceReport::new(table, store);
        info!(n, accuracy = report.accuracy(), "train/evaluate finished");
        Ok(report)
    }

    /// Leave-one-out cross-validation.
    ///
    /// Each instance is predicted by a model trained on all the others. All
    /// `n` predictions go into one table, and `AUC` plus the requested
    /// measures are computed once over the full decision vector.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than 2 instances, the labels hold
    /// a single class, or training/prediction fails.
    pub fn leave_one_out(&self) -> Result<PerformanceReport> {
        let n = self.problem.len();
        if n < 2 {
            return Err(FoldwiseError::InvalidInput(format!(
                "leave-one-out needs at least 2 instances, got {}",
                n
            )));
        }
        let labels = self.problem.labels();
        require_two_classes(&labels)?;

        let mut decisions = Vec::with_capacity(n);
        let mut table = ContingencyTable::new();
        for (i, &label) in labels.iter().enumerate() {
            let (train, test) = self.split(self.problem.without(i), self.problem.filter(&[i]));
            let model = self.classifier.train(&train)?;
            let decision = self.classifier.predict(&model, &test, 0)?;
            table.observe_decision(label, decision);
            decisions.push(decision);
        }

        let mut store = EvaluationMeasure::new();
        record_auc_family(
            &self.evaluator,
            &self.measures,
            &decisions,
            &labels,
            &table,
            &mut store,
        )?;
        let report = PerformanceReport::new(table, store);
        info!(n, accuracy = report.accuracy(), "leave-one-out finished");
        Ok(report)
    }

    /// Repeated stratified k-fold cross-validation.
    ///
    /// Every repeat draws a fresh fold assignment from `rng`. Each fold is
    /// predicted by a model trained on the other folds; its predictions feed
    /// the pooled table and a per-fold table whose F1 is recorded as `F-1`.
    /// `AUC` and the requested measures are recorded once per fold.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `k < 2`, `k > n`, `repeats == 0` or the labels
    ///   hold fewer than two classes. Nothing is trained in that case.
    /// - `InfeasiblePartition` if the minority class has fewer than `k`
    ///   instances.
    /// - Any training or prediction error of the backend.
    pub fn k_fold<R>(&self, k: usize, repeats: usize, rng: &mut R) -> Result<PerformanceReport>
    where
        R: Rng + ?Sized,
    {
        let n = self.problem.len();
        let labels = self.problem.labels();
        validate_k_fold(&labels, k, repeats)?;

        let mut table = ContingencyTable::new();
        let mut store = EvaluationMeasure::new();
        let mut folds = Vec::with_capacity(k * repeats);

        for repeat in 0..repeats {
            let assignment = self.assigner.assign(&labels, k, rng)?;
            for fold in 0..k {
                let train_idx = assignment.train_indices(fold);
                let test_idx = assignment.test_indices(fold);
                let (train, test) = self.split(
                    self.problem.filter(&train_idx),
                    self.problem.filter(&test_idx),
                );
                let model = self.classifier.train(&train)?;

                let mut decisions = Vec::with_capacity(test_idx.len());
                let mut fold_labels = Vec::with_capacity(test_idx.len());
                for (j, &i) in test_idx.iter().enumerate() {
                    decisions.push(self.classifier.predict(&model, &test, j)?);
                    fold_labels.push(labels[i]);
                }

                let micro = evaluate_fold(
                    &self.evaluator,
                    &self.measures,
                    &decisions,
                    &fold_labels,
                    &mut store,
                )?;
                table.merge(&micro);
                debug!(repeat, fold, n_test = test_idx.len(), "fold evaluated");
                folds.push(FoldOutcome {
                    repeat,
                    fold,
                    n_train: train_idx.len(),
                    n_test: test_idx.len(),
                    table: micro,
                });
            }
        }

        let mut report = PerformanceReport::new(table, store);
        report.folds = folds;
        info!(
            n,
            k,
            repeats,
            accuracy = report.accuracy(),
            "k-fold cross-validation finished"
        );
        Ok(report)
    }

    /// Run the protocol selected by `config` and render the report with
    /// `config.delimiter`.
    ///
    /// The configured measures, attempt budget and scaling replace the
    /// current ones; k-fold draws its folds from a generator seeded with
    /// `config.seed`.
    pub fn run(&mut self, config: &CvConfig) -> Result<TabularReport> {
        config.validate()?;
        self.measures = config.measures.clone();
        self.assigner = FoldAssigner::new(config.max_assignment_attempts);
        self.scaling = config.scaling;
        let report = match config.mode {
            CvMode::TrainEvaluate => self.train_evaluate()?,
            CvMode::LeaveOneOut => self.leave_one_out()?,
            CvMode::KFold => {
                let mut rng = StdRng::seed_from_u64(config.seed);
                self.k_fold(config.folds, config.repeats, &mut rng)?
            }
        };
        Ok(TabularReport::new(report, config.delimiter))
    }

    /// A scaler fitted on `train`, or `None` without scaling.
    fn fit_scaler(&self, train: &C::Problem) -> Option<Box<dyn FeatureScaler>> {
        let mut scaler = self.scaling.scaler()?;
        train.observe_features(scaler.as_mut());
        Some(scaler)
    }

    /// Scale a train/test split with statistics of `train` only.
    fn split(&self, train: C::Problem, test: C::Problem) -> (C::Problem, C::Problem) {
        match self.fit_scaler(&train) {
            Some(scaler) => (
                train.scale_features(scaler.as_ref()),
                test.scale_features(scaler.as_ref()),
            ),
            None => (train, test),
        }
    }
}

/// Evaluate precomputed `(decisions, labels)` test splits.
///
/// Each split is treated like a cross-validation fold: its predictions feed
/// the pooled table and its own table, `F-1` and `AUC` are recorded, then
/// every requested measure.
///
/// # Errors
///
/// Returns an error if `splits` is empty or a split is empty or has
/// mismatched lengths.
pub fn test_set_evaluation<S>(
    evaluator: &AucEvaluator,
    splits: &[(Vec<f64>, Vec<f64>)],
    measures: &[S],
) -> Result<PerformanceReport>
where
    S: AsRef<str>,
{
    if splits.is_empty() {
        return Err(FoldwiseError::InvalidInput("no test splits".into()));
    }

    let mut table = ContingencyTable::new();
    let mut store = EvaluationMeasure::new();
    let mut folds = Vec::with_capacity(splits.len());
    for (fold, (decisions, labels)) in splits.iter().enumerate() {
        let micro = evaluate_fold(evaluator, measures, decisions, labels, &mut store)?;
        table.merge(&micro);
        folds.push(FoldOutcome {
            repeat: 0,
            fold,
            n_train: 0,
            n_test: decisions.len(),
            table: micro,
        });
    }

    let mut report = PerformanceReport::new(table, store);
    report.folds = folds;
    info!(splits = splits.len(), accuracy = report.accuracy(), "test set evaluation finished");
    Ok(report)
}

fn validate_k_fold(labels: &[f64], k: usize, repeats: usize) -> Result<()> {
    let n = labels.len();
    if k < 2 {
        return Err(FoldwiseError::InvalidInput("k must be >= 2".into()));
    }
    if k > n {
        return Err(FoldwiseError::InvalidInput(format!(
            "k ({}) > n_samples ({})",
            k, n
        )));
    }
    if repeats == 0 {
        return Err(FoldwiseError::InvalidInput("repeats must be > 0".into()));
    }
    require_two_classes(labels)
}

fn require_two_classes(labels: &[f64]) -> Result<()> {
    if distinct_classes(labels.iter().copied()) < 2 {
        return Err(FoldwiseError::InvalidInput(
            "labels must contain two classes".into(),
        ));
    }
    Ok(())
}

/// Score one fold: returns its own table and records `F-1`, `AUC` and the
/// requested measures.
fn evaluate_fold<S: AsRef<str>>(
    evaluator: &AucEvaluator,
    measures: &[S],
    decisions: &[f64],
    labels: &[f64],
    store: &mut EvaluationMeasure,
) -> Result<ContingencyTable> {
    let mut micro = ContingencyTable::new();
    for (&decision, &label) in decisions.iter().zip(labels) {
        micro.observe_decision(label, decision);
    }
    store.add_value(F1_MEASURE, micro.f1_measure());
    record_auc_family(evaluator, measures, decisions, labels, &micro, store)?;
    Ok(micro)
}

/// Record `AUC`, the native `<name>-zero` value of every requested
/// [`NativeMeasure`], then the service value of every requested measure.
/// `AUC` itself is never requested twice.
fn record_auc_family<S: AsRef<str>>(
    evaluator: &AucEvaluator,
    measures: &[S],
    decisions: &[f64],
    labels: &[f64],
    table: &ContingencyTable,
    store: &mut EvaluationMeasure,
) -> Result<()> {
    let auc = evaluator.area_under_roc(decisions, labels)?;
    store.record(AUC_MEASURE, auc);

    for name in measures {
        if let Some(native) = NativeMeasure::from_name(name.as_ref()) {
            let value = match native {
                NativeMeasure::Auc => auc,
                other => other.at_zero(table),
            };
            store.record(&native.zero_name(), value);
        }
    }

    let delegated: Vec<&str> = measures
        .iter()
        .map(AsRef::as_ref)
        .filter(|&name| name != AUC_MEASURE)
        .collect();
    if !delegated.is_empty() {
        for (name, value) in evaluator.evaluate_measures(decisions, labels, &delegated)? {
            store.record(&name, value);
        }
    }
    Ok(())
}
