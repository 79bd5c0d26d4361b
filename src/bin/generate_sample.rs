use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `[lo, hi]`.
    fn range(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_f64() * (hi - lo + 1) as f64) as i64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Pick an index with the given relative weights.
    fn weighted(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        let mut roll = self.next_f64() * total;
        for (i, w) in weights.iter().enumerate() {
            if roll < *w {
                return i;
            }
            roll -= w;
        }
        weights.len() - 1
    }
}

/// One synthetic student row, columns in source-file order.
struct Student {
    marital_status: i64,
    nationality: i64,
    gender: &'static str,
    age_at_enrollment: i64,
    international: i64,
    mothers_occupation: i64,
    fathers_occupation: i64,
    scholarship: i64,
    credited: i64,
    evaluated: i64,
    grade: f64,
    target: i64,
}

fn generate_student(rng: &mut SimpleRng) -> Student {
    let gender = if rng.next_f64() < 0.45 { "Male" } else { "Female" };
    let scholarship = (rng.next_f64() < 0.25) as i64;
    let nationality = if rng.next_f64() < 0.92 {
        1
    } else {
        rng.range(2, 21)
    };

    // Scholarship holders drop out less often; the gap keeps the
    // scholarship-vs-outcome charts from looking flat.
    let weights = if scholarship == 1 {
        [0.15, 0.65, 0.20]
    } else {
        [0.35, 0.45, 0.20]
    };
    let target = rng.weighted(&weights) as i64; // 0 Dropout, 1 Graduate, 2 Enrolled

    let grade_mean = match target {
        0 => 7.0,
        1 => 13.0,
        _ => 11.0,
    };
    let grade = rng.gauss(grade_mean, 2.2).clamp(0.0, 18.5);

    let evaluated = rng.range(4, 14);
    // Graduates complete most of what they attempt.
    let completion = match target {
        0 => 0.35,
        1 => 0.92,
        _ => 0.70,
    };
    let credited = ((evaluated as f64) * completion * (0.7 + 0.6 * rng.next_f64())) as i64;

    Student {
        marital_status: if rng.next_f64() < 0.85 { 1 } else { rng.range(2, 6) },
        nationality,
        gender,
        age_at_enrollment: (17.0 + rng.gauss(4.0, 5.0).abs()).min(55.0) as i64,
        international: (nationality != 1) as i64,
        mothers_occupation: rng.range(0, 12),
        fathers_occupation: rng.range(0, 12),
        scholarship,
        credited: credited.min(evaluated),
        evaluated,
        grade,
        target,
    }
}

const COLUMNS: &[(&str, DataType)] = &[
    ("Marital status", DataType::Int64),
    ("Nacionality", DataType::Int64),
    ("Gender", DataType::Utf8),
    ("Age at enrollment", DataType::Int64),
    ("International", DataType::Int64),
    ("Mother's occupation", DataType::Int64),
    ("Father's occupation", DataType::Int64),
    ("Scholarship holder", DataType::Int64),
    ("Curricular units 2nd sem (credited)", DataType::Int64),
    ("Curricular units 2nd sem (2)", DataType::Int64),
    ("Curricular units 2nd sem (grade)", DataType::Float64),
    ("Target", DataType::Int64),
];

fn write_parquet(students: &[Student], path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(
        COLUMNS
            .iter()
            .map(|(name, ty)| Field::new(*name, ty.clone(), false))
            .collect::<Vec<_>>(),
    ));

    let int_col = |f: fn(&Student) -> i64| -> Arc<dyn arrow::array::Array> {
        Arc::new(Int64Array::from(
            students.iter().map(f).collect::<Vec<_>>(),
        ))
    };
    let arrays: Vec<Arc<dyn arrow::array::Array>> = vec![
        int_col(|s| s.marital_status),
        int_col(|s| s.nationality),
        Arc::new(StringArray::from(
            students.iter().map(|s| s.gender).collect::<Vec<_>>(),
        )),
        int_col(|s| s.age_at_enrollment),
        int_col(|s| s.international),
        int_col(|s| s.mothers_occupation),
        int_col(|s| s.fathers_occupation),
        int_col(|s| s.scholarship),
        int_col(|s| s.credited),
        int_col(|s| s.evaluated),
        Arc::new(Float64Array::from(
            students.iter().map(|s| s.grade).collect::<Vec<_>>(),
        )),
        int_col(|s| s.target),
    ];

    let batch = RecordBatch::try_new(schema.clone(), arrays)
        .context("failed to assemble record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {path}"))?;
    let mut writer =
        ArrowWriter::try_new(file, schema, None).context("failed to create parquet writer")?;
    writer.write(&batch).context("failed to write batch")?;
    writer.close().context("failed to close parquet writer")?;
    Ok(())
}

fn write_csv(students: &[Student], path: &str) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("failed to create {path}"))?;
    writer.write_record(COLUMNS.iter().map(|(name, _)| *name))?;
    for s in students {
        writer.write_record(&[
            s.marital_status.to_string(),
            s.nationality.to_string(),
            s.gender.to_string(),
            s.age_at_enrollment.to_string(),
            s.international.to_string(),
            s.mothers_occupation.to_string(),
            s.fathers_occupation.to_string(),
            s.scholarship.to_string(),
            s.credited.to_string(),
            s.evaluated.to_string(),
            format!("{:.2}", s.grade),
            s.target.to_string(),
        ])?;
    }
    writer.flush().context("failed to flush CSV")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let students: Vec<Student> = (0..500).map(|_| generate_student(&mut rng)).collect();

    write_parquet(&students, "sample_students.parquet")?;
    write_csv(&students, "sample_students.csv")?;

    let dropouts = students.iter().filter(|s| s.target == 0).count();
    println!(
        "Wrote {} students ({} dropouts) to sample_students.parquet / sample_students.csv",
        students.len(),
        dropouts
    );
    Ok(())
}
