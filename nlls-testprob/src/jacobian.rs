use faer::{
    Accum, Col, ColMut, ColRef, MatMut, MatRef, Par,
    linalg::matmul::{
        self,
        triangular::{self, BlockStructure},
    },
};

/// Whether to apply the Jacobian `J` or its transpose `Jᵀ`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Transpose {
    /// Compute `J u`. `u` has P entries, the output has N.
    #[default]
    No,
    /// Compute `Jᵀ u`. `u` has N entries, the output has P.
    Yes,
}

impl Transpose {
    /// Length of the direction vector, for a system with
    /// `n` residuals and `p` parameters.
    pub fn direction_len(self, n: usize, p: usize) -> usize {
        match self {
            Transpose::No => p,
            Transpose::Yes => n,
        }
    }

    /// Length of the product vector, for a system with
    /// `n` residuals and `p` parameters.
    pub fn output_len(self, n: usize, p: usize) -> usize {
        match self {
            Transpose::No => n,
            Transpose::Yes => p,
        }
    }
}

/// A request to apply the Jacobian (or its transpose) to a vector.
#[derive(Debug)]
pub struct Product<'a> {
    /// Which of `J` or `Jᵀ` to apply.
    pub trans: Transpose,
    /// The vector to apply it to.
    pub direction: ColRef<'a, f64>,
    /// Where the product gets written.
    pub out: ColMut<'a, f64>,
}

impl Product<'_> {
    /// Reborrow, so the same request can be passed down more than once.
    pub fn rb_mut(&mut self) -> Product<'_> {
        Product {
            trans: self.trans,
            direction: self.direction,
            out: self.out.as_mut(),
        }
    }
}

/// What a caller wants out of one Jacobian evaluation.
/// Both outputs are optional and independent, but asking for both in one call
/// means the Jacobian only gets assembled once.
#[derive(Debug, Default)]
pub struct JacobianRequest<'a> {
    /// Compute `J u` or `Jᵀ u`.
    pub product: Option<Product<'a>>,
    /// Overwrite the lower triangle (including the diagonal) of this P×P matrix with `JᵀJ`.
    /// The strictly upper triangle is left untouched.
    pub gram: Option<MatMut<'a, f64>>,
}

impl<'a> JacobianRequest<'a> {
    /// Only compute `J u` or `Jᵀ u`.
    pub fn product(trans: Transpose, direction: ColRef<'a, f64>, out: ColMut<'a, f64>) -> Self {
        Self {
            product: Some(Product {
                trans,
                direction,
                out,
            }),
            gram: None,
        }
    }

    /// Only compute `JᵀJ`.
    pub fn gram(out: MatMut<'a, f64>) -> Self {
        Self {
            product: None,
            gram: Some(out),
        }
    }

    /// Also compute `JᵀJ`.
    pub fn with_gram(mut self, out: MatMut<'a, f64>) -> Self {
        self.gram = Some(out);
        self
    }

    /// Nothing was asked for.
    pub fn is_empty(&self) -> bool {
        self.product.is_none() && self.gram.is_none()
    }

    /// Reborrow, so the caller can still read the outputs afterwards.
    pub fn rb_mut(&mut self) -> JacobianRequest<'_> {
        JacobianRequest {
            product: self.product.as_mut().map(Product::rb_mut),
            gram: self.gram.as_mut().map(|g| g.as_mut()),
        }
    }

    /// Panics if any output doesn't fit a system with `n` residuals and `p` parameters.
    pub(crate) fn assert_dims(&self, n: usize, p: usize) {
        if let Some(product) = &self.product {
            assert_eq!(
                product.direction.nrows(),
                product.trans.direction_len(n, p),
                "direction has the wrong length for {:?}",
                product.trans
            );
            assert_eq!(
                product.out.nrows(),
                product.trans.output_len(n, p),
                "product output has the wrong length for {:?}",
                product.trans
            );
        }
        if let Some(gram) = &self.gram {
            assert_eq!(
                (gram.nrows(), gram.ncols()),
                (p, p),
                "JTJ must be {p}x{p}"
            );
        }
    }
}

/// Serve a request from an already-assembled dense N×P Jacobian.
///
/// The product is a plain matrix-vector multiply. The Gram matrix is a
/// rank-N update of the lower triangle, so `J` is only ever read, never copied.
pub fn apply_dense(j: MatRef<'_, f64>, request: JacobianRequest<'_>) {
    let (n, p) = (j.nrows(), j.ncols());
    request.assert_dims(n, p);

    if let Some(Product {
        trans,
        direction,
        mut out,
    }) = request.product
    {
        let lhs = match trans {
            Transpose::No => j,
            Transpose::Yes => j.transpose(),
        };
        matmul::matmul(
            out.as_mat_mut(),
            Accum::Replace,
            lhs,
            direction.as_mat(),
            1.0,
            Par::Seq,
        );
    }

    if let Some(gram) = request.gram {
        triangular::matmul(
            gram,
            BlockStructure::TriangularLower,
            Accum::Replace,
            j.transpose(),
            BlockStructure::Rectangular,
            j,
            BlockStructure::Rectangular,
            1.0,
            Par::Seq,
        );
    }
}

/// Evaluate `uᵀ G u` where only the lower triangle of the symmetric `G` is read.
///
/// With `L` the lower triangle of `G` (diagonal included), `uᵀ G u = 2 uᵀ L u − Σ Gᵢᵢ uᵢ²`.
pub fn lower_quadratic_form(gram: MatRef<'_, f64>, u: ColRef<'_, f64>) -> f64 {
    assert_eq!(gram.nrows(), u.nrows(), "G and u must agree in size");
    let mut lu = Col::<f64>::zeros(u.nrows());
    triangular::matmul(
        lu.as_mut().as_mat_mut(),
        BlockStructure::Rectangular,
        Accum::Replace,
        gram,
        BlockStructure::TriangularLower,
        u.as_mat(),
        BlockStructure::Rectangular,
        1.0,
        Par::Seq,
    );
    let u_lu: f64 = u.iter().zip(lu.iter()).map(|(a, b)| a * b).sum();
    let diagonal: f64 = gram
        .diagonal()
        .column_vector()
        .iter()
        .zip(u.iter())
        .map(|(g, v)| g * v * v)
        .sum();
    2.0 * u_lu - diagonal
}
