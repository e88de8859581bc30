use crate::PostureErrors;
use nalgebra::DVector;
use sprs::CsMat;

/// Residual and sparse Jacobian evaluation, as consumed by a gradient based optimizer
pub trait DifferentiableSparseFunction {
    fn name(&self) -> &str;
    fn input_size(&self) -> usize;
    fn output_size(&self) -> usize;
    /// Capacity to reserve for the Jacobian, never below the true nonzero count
    fn nonzero_upper_bound(&self) -> usize;

    /// Writes the residual at `x` into `result`, which must have `output_size` rows
    fn compute(&mut self, x: &DVector<f64>, result: &mut DVector<f64>)
    -> Result<(), PostureErrors>;

    /// Replaces `jac` with the `output_size` x `input_size` Jacobian at `x`
    fn jacobian(&mut self, x: &DVector<f64>, jac: &mut CsMat<f64>) -> Result<(), PostureErrors>;

    fn evaluate(&mut self, x: &DVector<f64>) -> Result<DVector<f64>, PostureErrors> {
        let mut result = DVector::zeros(self.output_size());
        self.compute(x, &mut result)?;
        Ok(result)
    }

    fn sparse_jacobian(&mut self, x: &DVector<f64>) -> Result<CsMat<f64>, PostureErrors> {
        let mut jac = CsMat::zero((self.output_size(), self.input_size()));
        self.jacobian(x, &mut jac)?;
        Ok(jac)
    }
}

pub(crate) fn check_output(result: &DVector<f64>, expected: usize) -> Result<(), PostureErrors> {
    if result.len() != expected {
        return Err(PostureErrors::SizeMismatch {
            expected,
            got: result.len(),
        });
    }
    Ok(())
}
