mod banana;
mod qp;
mod quad2d;
