use crate::errors::{GmmError, Result};
use linfa::Float;
use ndarray::{concatenate, Array1, Array2, ArrayView2, Axis};

/// Source of planar points grouped in series.
///
/// The estimator extracts all series once at construction and flattens them
/// into its internal point store; series identity is not retained by the
/// algorithm, it only matters to whatever produced or displays the data.
pub trait PointSource<F: Float> {
    /// Point series, each of shape `(n_i, dim)`.
    fn series(&self) -> Vec<ArrayView2<'_, F>>;
}

impl<F: Float> PointSource<F> for Array2<F> {
    fn series(&self) -> Vec<ArrayView2<'_, F>> {
        vec![self.view()]
    }
}

impl<F: Float> PointSource<F> for Vec<Array2<F>> {
    fn series(&self) -> Vec<ArrayView2<'_, F>> {
        self.iter().map(|s| s.view()).collect()
    }
}

/// Flatten a point source into a single `(n, dim)` point store.
pub(crate) fn flatten_series<F: Float>(source: &impl PointSource<F>) -> Result<Array2<F>> {
    let series = source.series();
    let views: Vec<_> = series.into_iter().filter(|s| s.nrows() > 0).collect();
    let dim = match views.first() {
        Some(first) => first.ncols(),
        None => {
            return Err(GmmError::InvalidArgument(
                "point source contains no point".to_string(),
            ))
        }
    };
    if let Some(bad) = views.iter().find(|s| s.ncols() != dim) {
        return Err(GmmError::InvalidArgument(format!(
            "series width mismatch: expected {} coordinates, got {}",
            dim,
            bad.ncols()
        )));
    }
    concatenate(Axis(0), &views).map_err(|e| GmmError::InvalidArgument(e.to_string()))
}

/// Hard-labeled view of the fitted points: one point series per cluster plus
/// the current cluster centers, shaped for an external charting collaborator.
pub struct ClassifiedSeries<F: Float> {
    clusters: Vec<Array2<F>>,
    centroids: Array2<F>,
}

impl<F: Float> ClassifiedSeries<F> {
    pub(crate) fn new(
        points: &Array2<F>,
        labels: &Array1<usize>,
        centroids: Array2<F>,
    ) -> ClassifiedSeries<F> {
        let n_clusters = centroids.nrows();
        let dim = points.ncols();
        let mut counts = vec![0usize; n_clusters];
        for label in labels {
            counts[*label] += 1;
        }
        let mut clusters: Vec<Array2<F>> =
            counts.iter().map(|&c| Array2::zeros((c, dim))).collect();
        let mut next = vec![0usize; n_clusters];
        for (point, label) in points.rows().into_iter().zip(labels) {
            clusters[*label].row_mut(next[*label]).assign(&point);
            next[*label] += 1;
        }
        ClassifiedSeries {
            clusters,
            centroids,
        }
    }

    pub fn n_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Points currently assigned to cluster `k`.
    pub fn cluster(&self, k: usize) -> ArrayView2<'_, F> {
        self.clusters[k].view()
    }

    pub fn clusters(&self) -> &[Array2<F>] {
        &self.clusters
    }

    /// Current component means, one row per cluster.
    pub fn centroids(&self) -> &Array2<F> {
        &self.centroids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    #[test]
    fn test_flatten_preserves_order() {
        let series = vec![array![[0., 1.], [2., 3.]], array![[4., 5.]]];
        let flat = flatten_series(&series).unwrap();
        assert_eq!(flat, array![[0., 1.], [2., 3.], [4., 5.]]);
    }

    #[test]
    fn test_flatten_skips_empty_series() {
        let series = vec![Array2::zeros((0, 2)), array![[1., 2.]]];
        let flat = flatten_series(&series).unwrap();
        assert_eq!(flat, array![[1., 2.]]);
    }

    #[test]
    fn test_flatten_rejects_empty_source() {
        let series: Vec<Array2<f64>> = vec![];
        let err = flatten_series(&series).unwrap_err();
        assert!(matches!(err, GmmError::InvalidArgument(_)));

        let series = vec![Array2::<f64>::zeros((0, 2))];
        let err = flatten_series(&series).unwrap_err();
        assert!(matches!(err, GmmError::InvalidArgument(_)));
    }

    #[test]
    fn test_flatten_rejects_width_mismatch() {
        let series = vec![array![[0., 1.]], array![[0., 1., 2.]]];
        let err = flatten_series(&series).unwrap_err();
        assert!(matches!(err, GmmError::InvalidArgument(_)));
    }

    #[test]
    fn test_classified_series_grouping() {
        let points = array![[0., 0.], [1., 1.], [2., 2.], [3., 3.]];
        let labels = array![1, 0, 1, 0];
        let centroids = array![[2., 2.], [1., 1.]];
        let classified = ClassifiedSeries::new(&points, &labels, centroids);

        assert_eq!(2, classified.n_clusters());
        assert_eq!(classified.cluster(0), array![[1., 1.], [3., 3.]]);
        assert_eq!(classified.cluster(1), array![[0., 0.], [2., 2.]]);
        assert_eq!(*classified.centroids(), array![[2., 2.], [1., 1.]]);
    }
}
