//! Student registry.
//!
//! Students live in the registering organization's private namespace and
//! never leave it; other organizations see only their content hash.

use sharebook_core::{
    decode_record, encode_record, Student, StudentId, STUDENT_COUNTER_KEY, STUDENT_KEY_PREFIX,
};
use sharebook_store::Store;
use tracing::{debug, info};

use crate::counter::next_id;
use crate::error::Result;
use crate::identity::CallContext;
use crate::ledger::{prefix_end, Ledger};

impl<S: Store + ?Sized> Ledger<S> {
    /// Register a student under the caller's organization.
    ///
    /// The personal fields come from the invocation's transient map and are
    /// written only to the caller's private namespace.
    #[tracing::instrument(skip_all)]
    pub async fn register_student(&self, ctx: &CallContext) -> Result<StudentId> {
        let (caller, mut tx) = self.begin(ctx)?;
        let input = ctx.student_input()?;
        let namespace = caller.private_namespace();

        let seq = next_id(&mut tx, &namespace, STUDENT_COUNTER_KEY).await?;
        let student_id = StudentId::from_seq(seq, caller.domain());
        let student = Student::new(caller.clone(), student_id.clone(), input);

        tx.put(&namespace, student_id.as_str(), encode_record(&student)?)?;
        tx.commit().await?;

        info!(org = %caller, student = %student_id, "student registered");
        Ok(student_id)
    }

    /// Every student the caller registered.
    #[tracing::instrument(skip_all)]
    pub async fn list_students(&self, ctx: &CallContext) -> Result<Vec<Student>> {
        let (caller, mut tx) = self.begin(ctx)?;
        let namespace = caller.private_namespace();

        let mut students = Vec::new();
        for (key, bytes) in tx
            .range_scan(&namespace, STUDENT_KEY_PREFIX, &prefix_end(STUDENT_KEY_PREFIX))
            .await?
        {
            let student: Student = decode_record(&bytes)?;
            if student.org == caller {
                students.push(student);
            } else {
                debug!(%key, "skipping student registered by another principal");
            }
        }
        Ok(students)
    }
}
