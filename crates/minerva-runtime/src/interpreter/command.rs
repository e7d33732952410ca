//! Built-in command dispatch
//!
//! Commands evaluate their argument expressions, convert values at the
//! boundary, and delegate the numeric/IO work to the stdlib collaborators.
//! The whole command body is a recovery boundary: any failure inside it —
//! bad argument types, dimension mismatches, singular matrices, I/O — is
//! reported through the output sink and the script continues.
//!
//! Training commands share one pattern: train, store the model in the
//! registry (with its metrics), and bind the resulting value when the
//! script asked for one.

use super::Interpreter;
use crate::ast::{Command, Expr};
use crate::stdlib::{cluster, neural, plot, table};
use crate::value::{format_number, Metrics, Model, RuntimeError, Value};
use std::path::Path;
use std::sync::Arc;

/// Seed for fresh network weights; fixed so scripts are reproducible.
const MLP_SEED: u64 = 0x6d6c70;
const DEFAULT_LEARNING_RATE: f64 = 0.1;
const PERCEPTRON_EPOCHS: usize = 100;
const MLP_EPOCHS: usize = 1000;
const KMEANS_MAX_ITER: usize = 100;
const HISTOGRAM_BINS: usize = 10;
const FUNCTION_SAMPLES: usize = 100;

impl Interpreter {
    /// Runs one command, downgrading any failure to a report.
    pub(crate) fn exec_command(&mut self, command: &Command) -> Result<(), RuntimeError> {
        if let Err(err) = self.dispatch_command(command) {
            self.out.error(err.to_string());
        }
        Ok(())
    }

    fn dispatch_command(&mut self, command: &Command) -> Result<(), RuntimeError> {
        match command {
            Command::LinearRegression { x, y, bind } => self.cmd_linear_regression(x, y, bind),
            Command::Perceptron {
                x,
                y,
                learning_rate,
                epochs,
                bind,
            } => self.cmd_perceptron(x, y, learning_rate.as_ref(), epochs.as_ref(), bind),
            Command::MlpCreate {
                name,
                inputs,
                hidden,
                outputs,
            } => self.cmd_mlp_create(name, inputs, hidden, outputs),
            Command::MlpTrain {
                name,
                x,
                y,
                learning_rate,
                epochs,
            } => self.cmd_mlp_train(name, x, y, learning_rate.as_ref(), epochs.as_ref()),
            Command::Predict { model, data, bind } => self.cmd_predict(model, data, bind),
            Command::Evaluate {
                truth,
                predicted,
                metric,
                bind,
            } => self.cmd_evaluate(truth, predicted, metric.as_deref(), bind),
            Command::KMeans {
                data,
                k,
                max_iter,
                bind,
            } => self.cmd_kmeans(data, k, max_iter.as_ref(), bind),
            Command::Dbscan {
                data,
                eps,
                min_points,
                bind,
            } => self.cmd_dbscan(data, eps, min_points, bind),
            Command::Hierarchical {
                data,
                clusters,
                linkage,
                bind,
            } => self.cmd_hierarchical(data, clusters, linkage.as_deref(), bind),
            Command::ReadFile { path, lines, bind } => self.cmd_read_file(path, *lines, bind),
            Command::WriteFile {
                path,
                value,
                append,
            } => self.cmd_write_file(path, value, *append),
            Command::ReadCsv {
                path,
                delimiter,
                header,
                bind,
            } => self.cmd_read_csv(path, delimiter.as_deref(), *header, bind),
            Command::WriteCsv { path, data, header } => {
                self.cmd_write_csv(path, data, header.as_ref())
            }
            Command::SaveModel { model, path } => self.cmd_save_model(model, path),
            Command::LoadModel { path, bind } => self.cmd_load_model(path, bind),
            Command::PlotLine { x, y, title } => {
                let xs = self.eval_expr(x)?.number_list()?;
                let ys = self.eval_expr(y)?.number_list()?;
                plot::line(&mut self.out, &xs, &ys, title.as_deref().unwrap_or("line plot"))
            }
            Command::PlotScatter { x, y, title } => {
                let xs = self.eval_expr(x)?.number_list()?;
                let ys = self.eval_expr(y)?.number_list()?;
                plot::scatter(
                    &mut self.out,
                    &xs,
                    &ys,
                    title.as_deref().unwrap_or("scatter plot"),
                )
            }
            Command::PlotBar {
                labels,
                values,
                title,
            } => {
                let labels = self.eval_expr(labels)?.display_list()?;
                let values = self.eval_expr(values)?.number_list()?;
                plot::bar(
                    &mut self.out,
                    &labels,
                    &values,
                    title.as_deref().unwrap_or("bar chart"),
                )
            }
            Command::PlotHistogram { data, bins, title } => {
                let data = self.eval_expr(data)?.number_list()?;
                let bins = self.opt_count(bins.as_ref(), HISTOGRAM_BINS)?;
                plot::histogram(
                    &mut self.out,
                    &data,
                    bins,
                    title.as_deref().unwrap_or("histogram"),
                )
            }
            Command::PlotRegression { x, y, title } => {
                let xs = self.eval_expr(x)?.number_list()?;
                let ys = self.eval_expr(y)?.number_list()?;
                plot::regression(
                    &mut self.out,
                    &xs,
                    &ys,
                    title.as_deref().unwrap_or("regression"),
                )
                .map(|_| ())
            }
            Command::PlotFunction {
                function,
                start,
                end,
                title,
            } => self.cmd_plot_function(function, start, end, title.as_deref()),
        }
    }

    // ------------------------------------------------------------------
    // argument helpers
    // ------------------------------------------------------------------

    fn opt_number(&mut self, expr: Option<&Expr>, default: f64) -> Result<f64, RuntimeError> {
        match expr {
            Some(expr) => self.eval_expr(expr)?.as_number(),
            None => Ok(default),
        }
    }

    fn opt_count(&mut self, expr: Option<&Expr>, default: usize) -> Result<usize, RuntimeError> {
        match expr {
            Some(expr) => {
                let count = self.eval_expr(expr)?.as_int()?;
                if count < 0 {
                    return Err(RuntimeError::DimensionMismatch(format!(
                        "count must be non-negative, got {count}"
                    )));
                }
                Ok(count as usize)
            }
            None => Ok(default),
        }
    }

    fn count(&mut self, expr: &Expr) -> Result<usize, RuntimeError> {
        self.opt_count(Some(expr), 0)
    }

    /// Registers a trained model and binds it to a variable when asked.
    /// Without a bind name the registry entry is keyed by the model kind.
    fn finish_model(&mut self, bind: Option<&str>, model: Model, metrics: Metrics) {
        let model = Arc::new(model);
        let name = bind.unwrap_or_else(|| model.type_tag());
        self.models.store(name, Arc::clone(&model), metrics);
        if let Some(bind) = bind {
            self.scopes.define_local(bind, Value::Model(model));
        }
    }

    fn fetch_model(&self, name: &str) -> Result<Arc<Model>, RuntimeError> {
        self.models
            .fetch(name)
            .cloned()
            .ok_or_else(|| RuntimeError::NameNotFound(name.to_string()))
    }

    // ------------------------------------------------------------------
    // training and prediction
    // ------------------------------------------------------------------

    fn cmd_linear_regression(
        &mut self,
        x: &Expr,
        y: &Expr,
        bind: &Option<String>,
    ) -> Result<(), RuntimeError> {
        let xs = self.eval_expr(x)?.number_matrix()?;
        let ys = self.eval_expr(y)?.number_list()?;
        let model = neural::linear_regression(&xs, &ys)?;
        let Model::LinearRegression {
            intercept,
            coefficients,
        } = &model
        else {
            unreachable!("linear_regression produced a different model kind")
        };
        let fitted = neural::linear_regression_predict(*intercept, coefficients, &xs);
        let mse = neural::mean_squared_error(&ys, &fitted)?;

        let mut metrics = Metrics::new();
        metrics.insert("mse".to_string(), mse);
        self.out.line(format!(
            "linear regression trained, mse = {}",
            format_number(mse)
        ));
        self.finish_model(bind.as_deref(), model, metrics);
        Ok(())
    }

    fn cmd_perceptron(
        &mut self,
        x: &Expr,
        y: &Expr,
        learning_rate: Option<&Expr>,
        epochs: Option<&Expr>,
        bind: &Option<String>,
    ) -> Result<(), RuntimeError> {
        let xs = self.eval_expr(x)?.number_matrix()?;
        let ys = self.eval_expr(y)?.number_list()?;
        let learning_rate = self.opt_number(learning_rate, DEFAULT_LEARNING_RATE)?;
        let epochs = self.opt_count(epochs, PERCEPTRON_EPOCHS)?;

        let (model, converged) = neural::perceptron_train(&xs, &ys, learning_rate, epochs)?;
        match converged {
            Some(epoch) => self
                .out
                .line(format!("perceptron converged after {epoch} epochs")),
            None => self
                .out
                .line(format!("perceptron did not converge within {epochs} epochs")),
        }

        let Model::Perceptron { weights, bias } = &model else {
            unreachable!("perceptron_train produced a different model kind")
        };
        let predictions = neural::perceptron_predict(weights, *bias, &xs);
        let truth: Vec<i64> = ys.iter().map(|&v| v as i64).collect();
        let predicted: Vec<i64> = predictions.iter().map(|&v| v as i64).collect();
        let accuracy = neural::accuracy(&truth, &predicted)?;

        let mut metrics = Metrics::new();
        metrics.insert("accuracy".to_string(), accuracy);
        self.finish_model(bind.as_deref(), model, metrics);
        Ok(())
    }

    fn cmd_mlp_create(
        &mut self,
        name: &str,
        inputs: &Expr,
        hidden: &Expr,
        outputs: &Expr,
    ) -> Result<(), RuntimeError> {
        let inputs = self.count(inputs)?;
        let hidden = self.count(hidden)?;
        let outputs = self.count(outputs)?;
        if inputs == 0 || hidden == 0 || outputs == 0 {
            return Err(RuntimeError::DimensionMismatch(
                "network layers need at least one unit each".to_string(),
            ));
        }

        let net = neural::mlp_create(inputs, hidden, outputs, MLP_SEED);
        self.out.line(format!(
            "network '{name}' created: {inputs} inputs, {hidden} hidden, {outputs} outputs"
        ));
        self.finish_model(Some(name), Model::Mlp(net), Metrics::new());
        Ok(())
    }

    fn cmd_mlp_train(
        &mut self,
        name: &str,
        x: &Expr,
        y: &Expr,
        learning_rate: Option<&Expr>,
        epochs: Option<&Expr>,
    ) -> Result<(), RuntimeError> {
        let model = self.fetch_model(name)?;
        let Model::Mlp(net) = model.as_ref().clone() else {
            return Err(RuntimeError::TypeMismatch(format!(
                "model '{name}' is a {}, not a network",
                model.type_tag()
            )));
        };

        let xs = self.eval_expr(x)?.number_matrix()?;
        let targets_value = self.eval_expr(y)?;
        // A flat list of targets trains a single-output network.
        let targets = match targets_value.number_matrix() {
            Ok(rows) => rows,
            Err(_) => targets_value
                .number_list()?
                .into_iter()
                .map(|v| vec![v])
                .collect(),
        };
        let learning_rate = self.opt_number(learning_rate, DEFAULT_LEARNING_RATE)?;
        let epochs = self.opt_count(epochs, MLP_EPOCHS)?;

        let (trained, error) = neural::mlp_train(net, &xs, &targets, learning_rate, epochs)?;
        self.out.line(format!(
            "network '{name}' trained, error = {}",
            format_number(error)
        ));

        let mut metrics = Metrics::new();
        metrics.insert("error".to_string(), error);
        self.finish_model(Some(name), Model::Mlp(trained), metrics);
        Ok(())
    }

    fn cmd_predict(
        &mut self,
        model: &str,
        data: &Expr,
        bind: &Option<String>,
    ) -> Result<(), RuntimeError> {
        let entry = self.fetch_model(model)?;
        let xs = self.eval_expr(data)?.number_matrix()?;

        let result = match entry.as_ref() {
            Model::Perceptron { weights, bias } => {
                Value::from_number_list(neural::perceptron_predict(weights, *bias, &xs))
            }
            Model::Mlp(net) => Value::from_number_list(neural::mlp_predict(net, &xs)),
            Model::LinearRegression {
                intercept,
                coefficients,
            } => Value::from_number_list(neural::linear_regression_predict(
                *intercept,
                coefficients,
                &xs,
            )),
            Model::KMeans { centroids, .. } => {
                Value::from_label_list(cluster::kmeans_predict(centroids, &xs))
            }
            Model::Dbscan { .. } | Model::Hierarchical { .. } => {
                return Err(RuntimeError::TypeMismatch(format!(
                    "'{}' models cannot label new data",
                    entry.type_tag()
                )))
            }
            Model::Loaded { path } => {
                return Err(RuntimeError::TypeMismatch(format!(
                    "model loaded from '{path}' carries no payload to predict with"
                )))
            }
        };

        match bind {
            Some(bind) => self.scopes.define_local(bind, result),
            None => self.out.line(result.to_string()),
        }
        Ok(())
    }

    fn cmd_evaluate(
        &mut self,
        truth: &Expr,
        predicted: &Expr,
        metric: Option<&str>,
        bind: &Option<String>,
    ) -> Result<(), RuntimeError> {
        let metric = metric.unwrap_or("accuracy");
        let truth_value = self.eval_expr(truth)?;
        let predicted_value = self.eval_expr(predicted)?;

        let result = match metric {
            "accuracy" => Value::Number(neural::accuracy(
                &truth_value.label_list()?,
                &predicted_value.label_list()?,
            )?),
            "mse" => Value::Number(neural::mean_squared_error(
                &truth_value.number_list()?,
                &predicted_value.number_list()?,
            )?),
            "confusion" => Value::from_number_matrix(neural::confusion_matrix(
                &truth_value.label_list()?,
                &predicted_value.label_list()?,
            )?),
            // Unlabeled case: `truth` holds the samples, `predicted` the
            // cluster assignment.
            "silhouette" => Value::Number(cluster::silhouette(
                &truth_value.number_matrix()?,
                &predicted_value.label_list()?,
            )?),
            other => {
                return Err(RuntimeError::TypeMismatch(format!(
                    "unknown metric '{other}'"
                )))
            }
        };

        match bind {
            Some(bind) => self.scopes.define_local(bind, result),
            None => self.out.line(format!("{metric} = {result}")),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // clustering
    // ------------------------------------------------------------------

    fn cmd_kmeans(
        &mut self,
        data: &Expr,
        k: &Expr,
        max_iter: Option<&Expr>,
        bind: &Option<String>,
    ) -> Result<(), RuntimeError> {
        let samples = self.eval_expr(data)?.number_matrix()?;
        let k = self.count(k)?;
        let max_iter = self.opt_count(max_iter, KMEANS_MAX_ITER)?;

        let (model, iterations, converged) = cluster::kmeans(&samples, k, max_iter)?;
        let Model::KMeans {
            centroids,
            assignments,
            ..
        } = &model
        else {
            unreachable!("kmeans produced a different model kind")
        };
        let inertia = cluster::inertia(&samples, centroids, assignments);

        let status = if converged { "converged" } else { "stopped" };
        self.out.line(format!(
            "kmeans {status} after {iterations} iterations, inertia = {}",
            format_number(inertia)
        ));

        let mut metrics = Metrics::new();
        metrics.insert("inertia".to_string(), inertia);
        self.finish_model(bind.as_deref(), model, metrics);
        Ok(())
    }

    fn cmd_dbscan(
        &mut self,
        data: &Expr,
        eps: &Expr,
        min_points: &Expr,
        bind: &Option<String>,
    ) -> Result<(), RuntimeError> {
        let samples = self.eval_expr(data)?.number_matrix()?;
        let eps = self.eval_expr(eps)?.as_number()?;
        let min_points = self.count(min_points)?;

        let (labels, clusters) = cluster::dbscan(&samples, eps, min_points)?;
        let noise = labels.iter().filter(|&&l| l == cluster::NOISE).count();
        self.out.line(format!(
            "dbscan found {clusters} clusters, {noise} noise points"
        ));

        let mut metrics = Metrics::new();
        metrics.insert("clusters".to_string(), clusters as f64);
        self.finish_model(
            bind.as_deref(),
            Model::Dbscan {
                labels,
                clusters,
                eps,
                min_points,
            },
            metrics,
        );
        Ok(())
    }

    fn cmd_hierarchical(
        &mut self,
        data: &Expr,
        clusters: &Expr,
        linkage: Option<&str>,
        bind: &Option<String>,
    ) -> Result<(), RuntimeError> {
        let samples = self.eval_expr(data)?.number_matrix()?;
        let clusters = self.count(clusters)?;
        let linkage_name = linkage.unwrap_or("average");
        let linkage = cluster::Linkage::from_name(linkage_name).ok_or_else(|| {
            RuntimeError::TypeMismatch(format!("unknown linkage '{linkage_name}'"))
        })?;

        let assignments = cluster::hierarchical(&samples, clusters, linkage)?;
        self.out.line(format!(
            "hierarchical clustering produced {clusters} clusters ({linkage_name} linkage)"
        ));

        let mut metrics = Metrics::new();
        metrics.insert("clusters".to_string(), clusters as f64);
        self.finish_model(
            bind.as_deref(),
            Model::Hierarchical {
                assignments,
                clusters,
            },
            metrics,
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // files and persistence
    // ------------------------------------------------------------------

    fn cmd_read_file(&mut self, path: &str, lines: bool, bind: &str) -> Result<(), RuntimeError> {
        let value = if lines {
            Value::List(
                table::read_lines(Path::new(path))?
                    .into_iter()
                    .map(Value::Str)
                    .collect(),
            )
        } else {
            Value::Str(table::read_to_string(Path::new(path))?)
        };
        self.scopes.define_local(bind, value);
        Ok(())
    }

    fn cmd_write_file(&mut self, path: &str, value: &Expr, append: bool) -> Result<(), RuntimeError> {
        let text = self.eval_expr(value)?.to_string();
        table::write_text(Path::new(path), &text, append)
    }

    fn cmd_read_csv(
        &mut self,
        path: &str,
        delimiter: Option<&str>,
        header: Option<bool>,
        bind: &str,
    ) -> Result<(), RuntimeError> {
        let delimiter = delimiter.and_then(|s| s.chars().next()).unwrap_or(',');
        let header = header.unwrap_or(true);

        let data = table::read_csv(Path::new(path), delimiter, header)?;
        let (numeric, failed) = table::convert_cells(&data.rows);
        for position in &failed {
            self.out
                .warning(format!("cell {position} is not numeric, substituted 0"));
        }

        let (rows, cols) = (numeric.len(), numeric.first().map_or(0, Vec::len));
        self.out
            .line(format!("loaded {rows} rows x {cols} columns from {path}"));

        self.dataframes.store(bind, data.headers, numeric.clone());
        self.scopes
            .define_local(bind, Value::from_number_matrix(numeric));
        Ok(())
    }

    fn cmd_write_csv(
        &mut self,
        path: &str,
        data: &Expr,
        header: Option<&Expr>,
    ) -> Result<(), RuntimeError> {
        let value = self.eval_expr(data)?;
        let rows: Vec<Vec<String>> = match &value {
            Value::Matrix(rows) => rows
                .iter()
                .map(|row| row.iter().map(Value::to_string).collect())
                .collect(),
            Value::List(items) => items
                .iter()
                .map(Value::display_list)
                .collect::<Result<_, _>>()?,
            other => {
                return Err(RuntimeError::TypeMismatch(format!(
                    "expected matrix of rows, found {}",
                    other.type_name()
                )))
            }
        };
        let headers = match header {
            Some(expr) => Some(self.eval_expr(expr)?.display_list()?),
            None => None,
        };

        table::write_csv(Path::new(path), headers.as_deref(), &rows, ',')?;
        self.out
            .line(format!("wrote {} rows to {path}", rows.len()));
        Ok(())
    }

    /// Persistence is a one-line marker file; reloading yields a
    /// placeholder model that cannot predict.
    fn cmd_save_model(&mut self, model: &str, path: &str) -> Result<(), RuntimeError> {
        let entry = self.fetch_model(model)?;
        table::write_text(
            Path::new(path),
            &format!("minerva-model {}", entry.type_tag()),
            false,
        )?;
        self.out.line(format!("saved model '{model}' to {path}"));
        Ok(())
    }

    fn cmd_load_model(&mut self, path: &str, bind: &str) -> Result<(), RuntimeError> {
        table::read_to_string(Path::new(path))?;
        self.out.line(format!("loaded model from {path}"));
        self.finish_model(
            Some(bind),
            Model::Loaded {
                path: path.to_string(),
            },
            Metrics::new(),
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // plots
    // ------------------------------------------------------------------

    /// Samples a user-defined function over `[start, end]` and draws the
    /// curve. The function must accept one number and return one.
    fn cmd_plot_function(
        &mut self,
        function: &str,
        start: &Expr,
        end: &Expr,
        title: Option<&str>,
    ) -> Result<(), RuntimeError> {
        let start = self.eval_expr(start)?.as_number()?;
        let end = self.eval_expr(end)?.as_number()?;
        if end <= start {
            return Err(RuntimeError::DimensionMismatch(format!(
                "empty interval [{}, {}]",
                format_number(start),
                format_number(end)
            )));
        }

        let mut xs = Vec::with_capacity(FUNCTION_SAMPLES + 1);
        let mut ys = Vec::with_capacity(FUNCTION_SAMPLES + 1);
        for i in 0..=FUNCTION_SAMPLES {
            let x = start + (end - start) * i as f64 / FUNCTION_SAMPLES as f64;
            let y = self.invoke(function, vec![Value::Number(x)])?.as_number()?;
            xs.push(x);
            ys.push(y);
        }

        plot::line(&mut self.out, &xs, &ys, title.unwrap_or(function))
    }
}
