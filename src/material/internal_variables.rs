use russell_lab::Vector;

/// Holds the internal (history) variables of a constitutive law
///
/// Two copies are kept: `current` holds the last committed state, which is the
/// starting point of every trial evaluation, whereas `previous` holds the state
/// committed before that and allows the last step to be undone.
#[derive(Clone, Debug)]
pub struct InternalVariables {
    /// Holds the last committed values
    current: Vector,

    /// Holds the values committed before the current ones
    previous: Vector,
}

impl InternalVariables {
    /// Allocates a new instance with zero values
    pub fn new(size: usize) -> Self {
        InternalVariables {
            current: Vector::new(size),
            previous: Vector::new(size),
        }
    }

    /// Returns the (fixed) number of internal variables
    pub fn size(&self) -> usize {
        self.current.dim()
    }

    /// Returns the last committed values
    pub fn current(&self) -> &Vector {
        &self.current
    }

    /// Returns the values committed before the current ones
    pub fn previous(&self) -> &Vector {
        &self.previous
    }

    /// Commits new values
    ///
    /// # Panics
    ///
    /// A panic will occur if `values` does not have the declared size.
    pub fn commit(&mut self, values: &Vector) {
        assert_eq!(values.dim(), self.current.dim());
        for i in 0..self.current.dim() {
            self.previous[i] = self.current[i];
            self.current[i] = values[i];
        }
    }

    /// Undoes the last commit
    pub fn rollback(&mut self) {
        for i in 0..self.current.dim() {
            self.current[i] = self.previous[i];
        }
    }

    /// Resets both copies to zero
    pub fn reset(&mut self) {
        for i in 0..self.current.dim() {
            self.current[i] = 0.0;
            self.previous[i] = 0.0;
        }
    }

    /// Returns the increment of the i-th variable over the last committed step
    pub fn delta(&self, i: usize) -> f64 {
        self.current[i] - self.previous[i]
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
